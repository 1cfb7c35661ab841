/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::debug;

use crate::error::FtpListParseError;
use crate::transfer::FtpLineDataReceiver;

mod entry_type;
mod list_time;

pub use entry_type::FtpFileEntryType;

/// One entry of a LIST reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpListEntry {
    name: String,
    entry_type: FtpFileEntryType,
    size: Option<u64>,
    modify_time: Option<DateTime<Utc>>,
    link_target: Option<String>,
}

/// Split on whitespace, keeping the byte offset of each field.
fn fields(line: &str) -> Vec<(usize, &str)> {
    let mut fields = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                fields.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        fields.push((s, &line[s..]));
    }
    fields
}

fn is_unix_mode(s: &str) -> bool {
    s.len() >= 10
        && s.starts_with(['-', 'd', 'l', 'b', 'c', 'p', 's'])
        && s.as_bytes()[1..10].iter().all(|b| b"rwxsStTl-".contains(b))
}

impl FtpListEntry {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn entry_type(&self) -> &FtpFileEntryType {
        &self.entry_type
    }

    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    #[inline]
    pub fn mtime(&self) -> Option<&DateTime<Utc>> {
        self.modify_time.as_ref()
    }

    #[inline]
    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    /// Parse one line of a LIST reply, `Ok(None)` for lines carrying no entry.
    pub fn parse_line(line: &str) -> Result<Option<Self>, FtpListParseError> {
        FtpListEntry::parse_line_at(line, Utc::now())
    }

    pub(crate) fn parse_line_at(
        line: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, FtpListParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields = fields(line);
        let Some((_, first)) = fields.first() else {
            return Ok(None);
        };
        if first.eq_ignore_ascii_case("total") && fields.len() == 2 {
            return Ok(None);
        }

        if is_unix_mode(first) {
            FtpListEntry::parse_unix(line, &fields, now).map(Some)
        } else if first.as_bytes()[0].is_ascii_digit() {
            FtpListEntry::parse_dos(line, &fields).map(Some)
        } else {
            Err(FtpListParseError::NotEnoughFields)
        }
    }

    fn parse_unix(
        line: &str,
        fields: &[(usize, &str)],
        now: DateTime<Utc>,
    ) -> Result<Self, FtpListParseError> {
        // mode links owner [group] size month day time name
        if fields.len() < 7 {
            return Err(FtpListParseError::NotEnoughFields);
        }
        let month_at = (3..fields.len() - 3)
            .find(|&i| {
                list_time::unix_month(fields[i].1).is_some()
                    && fields[i - 1].1.bytes().all(|b| b.is_ascii_digit())
            })
            .ok_or(FtpListParseError::NoTimeField)?;
        let month =
            list_time::unix_month(fields[month_at].1).ok_or(FtpListParseError::NoTimeField)?;
        let modify_time = match list_time::parse_unix(
            month,
            fields[month_at + 1].1,
            fields[month_at + 2].1,
            now,
        ) {
            Ok(t) => Some(t),
            Err(e) => {
                debug!("no modify time in list line '{line}': {e}");
                None
            }
        };
        let size = u64::from_str(fields[month_at - 1].1)
            .map_err(|_| FtpListParseError::InvalidSize)?;

        let name_start = fields[month_at + 3].0;
        let mut name = &line[name_start..];
        let mut entry_type = fields[0]
            .1
            .chars()
            .next()
            .map(FtpFileEntryType::from_unix_mode)
            .unwrap_or(FtpFileEntryType::Unknown);
        let mut link_target = None;
        if entry_type == FtpFileEntryType::Symlink
            && let Some((n, t)) = name.split_once(" -> ")
        {
            name = n;
            link_target = Some(t.to_string());
        }
        if name.is_empty() {
            return Err(FtpListParseError::EmptyName);
        }
        entry_type = entry_type.with_name(name);

        Ok(FtpListEntry {
            name: name.to_string(),
            entry_type,
            size: Some(size),
            modify_time,
            link_target,
        })
    }

    fn parse_dos(line: &str, fields: &[(usize, &str)]) -> Result<Self, FtpListParseError> {
        // date time <DIR>|size name
        if fields.len() < 4 {
            return Err(FtpListParseError::NotEnoughFields);
        }
        let modify_time = list_time::parse_dos(fields[0].1, fields[1].1)?;
        let (entry_type, size) = if fields[2].1.eq_ignore_ascii_case("<DIR>") {
            (FtpFileEntryType::Directory, None)
        } else {
            let size = u64::from_str(fields[2].1).map_err(|_| FtpListParseError::InvalidSize)?;
            (FtpFileEntryType::File, Some(size))
        };
        let name = &line[fields[3].0..];

        Ok(FtpListEntry {
            name: name.to_string(),
            entry_type: entry_type.with_name(name),
            size,
            modify_time: Some(modify_time),
            link_target: None,
        })
    }
}

/// Collects the parsed entries of a LIST data stream.
#[derive(Default)]
pub(crate) struct FtpListCollector {
    now: Option<DateTime<Utc>>,
    entries: Vec<FtpListEntry>,
}

impl FtpListCollector {
    pub(crate) fn into_entries(self) -> Vec<FtpListEntry> {
        self.entries
    }
}

impl FtpLineDataReceiver for FtpListCollector {
    fn recv_line(&mut self, line: &str) {
        let now = *self.now.get_or_insert_with(Utc::now);
        match FtpListEntry::parse_line_at(line, now) {
            Ok(Some(entry)) => self.entries.push(entry),
            Ok(None) => {}
            Err(e) => debug!("skip list line '{line}': {e}"),
        }
    }
}
