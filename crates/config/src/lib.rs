use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    InputPort,
    OutputPort,
    Uart,
}

impl DeviceKind {
    /// Register window in bytes when a descriptor leaves `size` out.
    pub fn default_size(&self) -> u64 {
        match self {
            DeviceKind::InputPort | DeviceKind::OutputPort => 0x4,
            DeviceKind::Uart => 0x8,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeviceConfig {
    pub id: String,
    pub r#type: DeviceKind,
    pub base_address: u64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub config: HashMap<String, serde_yaml::Value>,
}

impl DeviceConfig {
    pub fn size_bytes(&self) -> Result<u64> {
        match &self.size {
            Some(s) => parse_size(s),
            None => Ok(self.r#type.default_size()),
        }
    }

    /// Status reads the UART reports busy after each transmit; 0 when unset.
    pub fn tx_latency(&self) -> Result<u32> {
        let Some(value) = self.config.get("tx_latency") else {
            return Ok(0);
        };
        value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .with_context(|| {
                format!(
                    "Device '{}' tx_latency must be a non-negative integer, got {:?}",
                    self.id, value
                )
            })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BoardDescriptor {
    pub name: String,
    pub devices: Vec<DeviceConfig>,
}

impl BoardDescriptor {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open board descriptor at {:?}", path.as_ref()))?;
        let board: Self =
            serde_yaml::from_reader(f).context("Failed to parse Board Descriptor")?;
        board.validate()?;
        Ok(board)
    }

    /// Input port, output port and UART at 0x4000_0000, 0x5000_0000 and
    /// 0x6000_0000.
    pub fn default_board() -> Self {
        let device = |id: &str, r#type, base_address| DeviceConfig {
            id: id.to_string(),
            r#type,
            base_address,
            size: None,
            config: HashMap::new(),
        };
        Self {
            name: "switchport-soc".to_string(),
            devices: vec![
                device("iport", DeviceKind::InputPort, 0x4000_0000),
                device("oport", DeviceKind::OutputPort, 0x5000_0000),
                device("uart", DeviceKind::Uart, 0x6000_0000),
            ],
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            anyhow::bail!("Board '{}' declares no devices", self.name);
        }

        let mut ids = HashSet::new();
        let mut ranges = Vec::with_capacity(self.devices.len());
        for device in &self.devices {
            if !ids.insert(device.id.as_str()) {
                anyhow::bail!("Duplicate device id '{}'", device.id);
            }
            if device.base_address % 4 != 0 {
                anyhow::bail!(
                    "Device '{}' base address {:#x} is not word aligned",
                    device.id,
                    device.base_address
                );
            }
            let size = device.size_bytes()?;
            if size < device.r#type.default_size() || size % 4 != 0 {
                anyhow::bail!(
                    "Device '{}' size {} cannot hold its registers",
                    device.id,
                    size
                );
            }
            let Some(end) = device.base_address.checked_add(size) else {
                anyhow::bail!("Device '{}' range overflows the address space", device.id);
            };
            if device.r#type == DeviceKind::Uart {
                device.tx_latency()?;
            }
            ranges.push((device.base_address, end, &device.id));
        }

        ranges.sort_by_key(|r| r.0);
        for pair in ranges.windows(2) {
            if pair[1].0 < pair[0].1 {
                anyhow::bail!("Devices '{}' and '{}' overlap", pair[0].2, pair[1].2);
            }
        }

        Ok(())
    }

    pub fn device(&self, kind: DeviceKind) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.r#type == kind)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScenarioLimits {
    pub max_steps: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The controller is spinning on a hardware condition.
    Settled,
    MaxSteps,
    BusFault,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Stimulus {
    pub switches: u32,
    #[serde(default)]
    pub expect_output: Option<u32>,
    /// Bytes pushed through the UART helper once the controller has settled.
    #[serde(default)]
    pub uart_send: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct OutputEqualsAssertion {
    pub output_equals: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct UartContainsAssertion {
    pub uart_contains: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StopReasonAssertion {
    pub expected_stop_reason: StopReason,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum Assertion {
    OutputEquals(OutputEqualsAssertion),
    UartContains(UartContainsAssertion),
    ExpectedStopReason(StopReasonAssertion),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScenarioScript {
    pub schema_version: String,
    #[serde(default)]
    pub board: Option<String>,
    pub limits: ScenarioLimits,
    #[serde(default)]
    pub initial_switches: u32,
    #[serde(default)]
    pub stimulus: Vec<Stimulus>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

impl ScenarioScript {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open scenario script at {:?}", path.as_ref()))?;
        let script: Self =
            serde_yaml::from_reader(f).context("Failed to parse Scenario Script YAML")?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.limits.max_steps == 0 {
            anyhow::bail!("Limit 'max_steps' must be greater than zero");
        }

        if let Some(board) = &self.board {
            if board.trim().is_empty() {
                anyhow::bail!("Input 'board' path cannot be empty");
            }
        }

        Ok(())
    }
}

/// Parses `"8"`, `"0x8"` or a human readable size such as `"1 KiB"`.
pub fn parse_size(size_str: &str) -> Result<u64> {
    let trimmed = size_str.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return Ok(n);
    }
    if let Some(hex) = trimmed.strip_prefix("0x") {
        return u64::from_str_radix(hex, 16)
            .with_context(|| format!("Invalid hex size '{}'", size_str));
    }

    use human_size::{Byte, Size, SpecificSize};
    let s: Size = trimmed
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
