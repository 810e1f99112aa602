use thiserror::Error;

use crate::mem_filter::MemRegions;

/// Output toggles for a [`Tracer`](crate::Tracer).
///
/// Everything is off by default; instruction tables are still populated
/// while live print is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TracerConfig {
    pub print_insts: bool,
    pub print_insts_z80: bool,
    pub print_insts_svp: bool,
    pub mem_access: MemRegions,
    pub mem_access_z80: MemRegions,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for env var {var}")]
    InvalidEnv { var: &'static str, value: String },
}

pub const ENV_PRINT_INSTS: &str = "MD_TRACE_INSTS";
pub const ENV_PRINT_INSTS_Z80: &str = "MD_TRACE_INSTS_Z80";
pub const ENV_PRINT_INSTS_SVP: &str = "MD_TRACE_INSTS_SVP";
pub const ENV_MEM_ACCESS: &str = "MD_TRACE_MEM";
pub const ENV_MEM_ACCESS_Z80: &str = "MD_TRACE_MEM_Z80";

impl TracerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`TracerConfig::from_env`] with a caller-supplied variable
    /// source. Unset variables keep their default.
    pub fn from_lookup(mut lookup: impl FnMut(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut bool_var = |var: &'static str| match lookup(var) {
            Some(raw) => parse_bool(var, &raw),
            None => Ok(false),
        };
        let print_insts = bool_var(ENV_PRINT_INSTS)?;
        let print_insts_z80 = bool_var(ENV_PRINT_INSTS_Z80)?;
        let print_insts_svp = bool_var(ENV_PRINT_INSTS_SVP)?;

        let mem_access = match lookup(ENV_MEM_ACCESS) {
            Some(raw) => parse_regions(ENV_MEM_ACCESS, &raw)?,
            None => MemRegions::empty(),
        };
        let mem_access_z80 = match lookup(ENV_MEM_ACCESS_Z80) {
            Some(raw) => parse_regions(ENV_MEM_ACCESS_Z80, &raw)?,
            None => MemRegions::empty(),
        };

        Ok(Self {
            print_insts,
            print_insts_z80,
            print_insts_svp,
            mem_access,
            mem_access_z80,
        })
    }
}

fn invalid(var: &'static str, raw: &str) -> ConfigError {
    ConfigError::InvalidEnv {
        var,
        value: raw.to_owned(),
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, raw)),
    }
}

/// Accepts a numeric mask (`0x0b`, `11`) or region names separated by `,`
/// or `|` (`rom,ram`, `PORTS|MAIN_MEM`). `all` and `none` are also accepted.
fn parse_regions(var: &'static str, raw: &str) -> Result<MemRegions, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(MemRegions::empty());
    }

    let numeric = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => Some(u8::from_str_radix(hex, 16)),
        None if trimmed.bytes().all(|b| b.is_ascii_digit()) => Some(trimmed.parse::<u8>()),
        None => None,
    };
    if let Some(bits) = numeric {
        return bits
            .ok()
            .and_then(MemRegions::from_bits)
            .ok_or_else(|| invalid(var, raw));
    }

    let mut regions = MemRegions::empty();
    for name in trimmed.split([',', '|']).map(str::trim).filter(|s| !s.is_empty()) {
        let name = name.to_ascii_uppercase();
        regions |= match name.as_str() {
            "ALL" => MemRegions::all(),
            "NONE" => MemRegions::empty(),
            _ => MemRegions::from_name(&name).ok_or_else(|| invalid(var, raw))?,
        };
    }
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<TracerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TracerConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn unset_is_all_off() {
        assert_eq!(config(&[]).unwrap(), TracerConfig::default());
    }

    #[test]
    fn booleans() {
        let cfg = config(&[
            (ENV_PRINT_INSTS, "1"),
            (ENV_PRINT_INSTS_Z80, "Yes"),
            (ENV_PRINT_INSTS_SVP, "off"),
        ])
        .unwrap();
        assert!(cfg.print_insts);
        assert!(cfg.print_insts_z80);
        assert!(!cfg.print_insts_svp);

        assert_eq!(
            config(&[(ENV_PRINT_INSTS_SVP, "maybe")]),
            Err(ConfigError::InvalidEnv {
                var: ENV_PRINT_INSTS_SVP,
                value: "maybe".into()
            })
        );
    }

    #[test]
    fn region_names_and_masks() {
        let cfg = config(&[(ENV_MEM_ACCESS, "rom, VDP"), (ENV_MEM_ACCESS_Z80, "ports|main_mem")]).unwrap();
        assert_eq!(cfg.mem_access, MemRegions::ROM | MemRegions::VDP);
        assert_eq!(cfg.mem_access_z80, MemRegions::PORTS | MemRegions::MAIN_MEM);

        let cfg = config(&[(ENV_MEM_ACCESS, "0x03"), (ENV_MEM_ACCESS_Z80, "all")]).unwrap();
        assert_eq!(cfg.mem_access, MemRegions::ROM | MemRegions::RAM);
        assert_eq!(cfg.mem_access_z80, MemRegions::all());

        assert_eq!(config(&[(ENV_MEM_ACCESS, "16")]).unwrap().mem_access, MemRegions::VDP);
    }

    #[test]
    fn rejects_unknown_regions_and_bits() {
        assert!(config(&[(ENV_MEM_ACCESS, "rom,sram")]).is_err());
        assert!(config(&[(ENV_MEM_ACCESS, "0x40")]).is_err());
        assert!(config(&[(ENV_MEM_ACCESS_Z80, "999")]).is_err());
    }
}
