/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use humanize_rs::ParseError;
use humanize_rs::bytes::Bytes;
use yaml_rust::{Yaml, yaml};

use super::{FtpClientConfig, FtpControlConfig, FtpTransferConfig};

fn foreach_kv<F>(table: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in table.iter() {
        if let Yaml::String(key) = k {
            f(key, v).context(format!("failed to parse value of key {key}"))?;
        } else {
            return Err(anyhow!("key in hash should be string"));
        }
    }
    Ok(())
}

fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

fn as_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::String(s) => Ok(usize::from_str(s)?),
        Yaml::Integer(i) => Ok(usize::try_from(*i)?),
        _ => Err(anyhow!(
            "yaml value type for 'usize' should be 'string' or 'integer'"
        )),
    }
}

fn as_bool(v: &Yaml) -> anyhow::Result<bool> {
    match v {
        Yaml::String(s) => match s.to_lowercase().as_str() {
            "on" | "true" | "yes" | "1" => Ok(true),
            "off" | "false" | "no" | "0" => Ok(false),
            _ => Err(anyhow!("invalid yaml string value for 'bool': {s}")),
        },
        Yaml::Boolean(value) => Ok(*value),
        Yaml::Integer(i) => Ok(*i != 0),
        _ => Err(anyhow!(
            "yaml value type for 'bool' should be 'boolean' / 'string' / 'integer'"
        )),
    }
}

fn as_humanize_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::String(value) => {
            let v = value.parse::<Bytes>()?;
            Ok(v.size())
        }
        Yaml::Integer(value) => Ok(usize::try_from(*value)?),
        _ => Err(anyhow!(
            "yaml value type for humanize usize should be 'string' or 'integer'"
        )),
    }
}

fn as_humanize_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(value) => match humanize_rs::duration::parse(value) {
            Ok(v) => Ok(v),
            Err(ParseError::MissingUnit) => {
                if let Ok(u) = u64::from_str(value) {
                    Ok(Duration::from_secs(u))
                } else {
                    Err(anyhow!("invalid duration string"))
                }
            }
            Err(e) => Err(anyhow!("invalid humanize duration string: {e}")),
        },
        Yaml::Integer(value) => {
            if let Ok(u) = u64::try_from(*value) {
                Ok(Duration::from_secs(u))
            } else {
                Err(anyhow!("unsupported duration value"))
            }
        }
        _ => Err(anyhow!(
            "yaml value type for humanize duration should be 'string' or 'integer'"
        )),
    }
}

impl FtpControlConfig {
    pub fn parse_yaml(value: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = value {
            let mut config = FtpControlConfig::default();
            foreach_kv(map, |k, v| match normalize_key(k).as_str() {
                "max_line_len" | "max_line_length" => {
                    let len = as_humanize_usize(v)
                        .context(format!("invalid humanize usize value for key {k}"))?;
                    config.set_max_line_len(len);
                    Ok(())
                }
                "max_multi_lines" => {
                    config.max_multi_lines =
                        as_usize(v).context(format!("invalid usize value for key {k}"))?;
                    Ok(())
                }
                "command_timeout" => {
                    config.command_timeout = as_humanize_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
            Ok(config)
        } else {
            Err(anyhow!("invalid yaml type"))
        }
    }
}

impl FtpTransferConfig {
    pub fn parse_yaml(value: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = value {
            let mut config = FtpTransferConfig::default();
            foreach_kv(map, |k, v| match normalize_key(k).as_str() {
                "list_max_line_len" | "list_max_line_length" => {
                    let len = as_humanize_usize(v)
                        .context(format!("invalid humanize usize value for key {k}"))?;
                    config.set_list_max_line_len(len);
                    Ok(())
                }
                "list_max_entries" => {
                    config.list_max_entries =
                        as_usize(v).context(format!("invalid usize value for key {k}"))?;
                    Ok(())
                }
                "list_all_timeout" => {
                    config.list_all_timeout = as_humanize_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "end_wait_timeout" => {
                    config.end_wait_timeout = as_humanize_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "data_connect_timeout" => {
                    config.data_connect_timeout = as_humanize_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "accept_timeout" => {
                    config.accept_timeout = as_humanize_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "idle_timeout" => {
                    config.idle_timeout = as_humanize_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
            Ok(config)
        } else {
            Err(anyhow!("invalid yaml type"))
        }
    }
}

impl FtpClientConfig {
    pub fn parse_yaml(value: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = value {
            let mut config = FtpClientConfig::default();
            foreach_kv(map, |k, v| match normalize_key(k).as_str() {
                "control" => {
                    config.control = FtpControlConfig::parse_yaml(v).context(format!(
                        "invalid ftp control connection config value for key {k}"
                    ))?;
                    Ok(())
                }
                "transfer" => {
                    config.transfer = FtpTransferConfig::parse_yaml(v).context(format!(
                        "invalid ftp transfer connection config value for key {k}"
                    ))?;
                    Ok(())
                }
                "connect_timeout" => {
                    config.connect_timeout = as_humanize_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "greeting_timeout" => {
                    config.greeting_timeout = as_humanize_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "active_fallback" => {
                    config.active_fallback =
                        as_bool(v).context(format!("invalid bool value for key {k}"))?;
                    Ok(())
                }
                "active_only" => {
                    config.active_only =
                        as_bool(v).context(format!("invalid bool value for key {k}"))?;
                    Ok(())
                }
                "passive_use_control_host" => {
                    config.passive_use_control_host =
                        as_bool(v).context(format!("invalid bool value for key {k}"))?;
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
            Ok(config)
        } else {
            Err(anyhow!("invalid yaml type"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    fn yaml_doc(s: &str) -> Yaml {
        YamlLoader::load_from_str(s).unwrap().pop().unwrap()
    }

    #[test]
    fn ftp_control_config_parse_ok() {
        let yaml = yaml_doc(
            r#"
max_line_len: "2KB"
max_multi_lines: 256
command_timeout: "30s"
"#,
        );
        let config = FtpControlConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(config.max_line_len, 2000);
        assert_eq!(config.max_multi_lines, 256);
        assert_eq!(config.command_timeout, Duration::from_secs(30));

        let yaml = yaml_doc("max-line-length: 1KiB");
        let config = FtpControlConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(config.max_line_len, 1024);
    }

    #[test]
    fn ftp_control_config_parse_err() {
        let yaml = yaml_doc(r#"invalid_key: "value""#);
        assert!(FtpControlConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"max_line_len: "2KBX""#);
        assert!(FtpControlConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc("max_multi_lines: -1");
        assert!(FtpControlConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"command_timeout: "invalid_duration""#);
        assert!(FtpControlConfig::parse_yaml(&yaml).is_err());

        let yaml = Yaml::String("invalid".to_string());
        assert!(FtpControlConfig::parse_yaml(&yaml).is_err());
    }

    #[test]
    fn ftp_transfer_config_parse_ok() {
        let yaml = yaml_doc(
            r#"
list_max_line_len: "4KB"
list_max_entries: 2048
list_all_timeout: "5m"
end_wait_timeout: "500ms"
data_connect_timeout: 3
accept_timeout: "2s"
idle_timeout: "1m"
"#,
        );
        let config = FtpTransferConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(config.list_max_line_len, 4000);
        assert_eq!(config.list_max_entries, 2048);
        assert_eq!(config.list_all_timeout, Duration::from_secs(300));
        assert_eq!(config.end_wait_timeout, Duration::from_millis(500));
        assert_eq!(config.data_connect_timeout, Duration::from_secs(3));
        assert_eq!(config.accept_timeout, Duration::from_secs(2));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
    }

    #[test]
    fn ftp_transfer_config_parse_err() {
        let yaml = yaml_doc(r#"invalid_key: "value""#);
        assert!(FtpTransferConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc("list_max_entries: -2048");
        assert!(FtpTransferConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"list_all_timeout: "5x""#);
        assert!(FtpTransferConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"end_wait_timeout: "-500ms""#);
        assert!(FtpTransferConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc("accept_timeout: -1");
        assert!(FtpTransferConfig::parse_yaml(&yaml).is_err());
    }

    #[test]
    fn ftp_client_config_parse_ok() {
        let yaml = yaml_doc(
            r#"
control:
  max_line_len: "2KB"
  command_timeout: "15s"
transfer:
  list_max_entries: 1024
  end_wait_timeout: "1s"
connect_timeout: "10s"
greeting_timeout: "5s"
active_fallback: false
active-only: "yes"
passive_use_control_host: true
"#,
        );
        let config = FtpClientConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(config.control.max_line_len, 2000);
        assert_eq!(config.control.max_multi_lines, 128);
        assert_eq!(config.control.command_timeout, Duration::from_secs(15));
        assert_eq!(config.transfer.list_max_entries, 1024);
        assert_eq!(config.transfer.end_wait_timeout, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.greeting_timeout, Duration::from_secs(5));
        assert!(!config.active_fallback);
        assert!(config.active_only);
        assert!(config.passive_use_control_host);
    }

    #[test]
    fn ftp_client_config_parse_err() {
        let yaml = yaml_doc(r#"invalid_key: "value""#);
        assert!(FtpClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"control: "invalid""#);
        assert!(FtpClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc("transfer: 1234");
        assert!(FtpClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"greeting_timeout: "5z""#);
        assert!(FtpClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"active_fallback: "not_a_boolean""#);
        assert!(FtpClientConfig::parse_yaml(&yaml).is_err());
    }

    #[test]
    fn parse_invalid_yaml_types() {
        for yaml in [
            Yaml::Array(vec![]),
            Yaml::Integer(123),
            Yaml::Boolean(true),
            Yaml::Null,
        ] {
            assert!(FtpControlConfig::parse_yaml(&yaml).is_err());
            assert!(FtpTransferConfig::parse_yaml(&yaml).is_err());
            assert!(FtpClientConfig::parse_yaml(&yaml).is_err());
        }
    }
}
