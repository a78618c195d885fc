//! Command line surface of `axe` and the handlers behind each subcommand.

use axe_client::{ClientConfig, OtaEvent, OtaTarget, SystemApi, SystemInfo, SystemUpdate};
use axe_types::ApiVersion;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Parser)]
#[command(name = "axe", version, about = "Query and manage AxeOS mining devices")]
pub struct Cli {
    /// Device origin, e.g. http://192.168.1.50 [env: AXE_BASE_URL]
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// API generation: v1 (/api/system) or v2 (/api/v2/system) [env: AXE_API_VERSION]
    #[arg(long, global = true)]
    pub api_version: Option<ApiVersion>,

    /// Use canned device data instead of a device [env: AXE_MOCK]
    #[arg(long, global = true, conflicts_with = "no_mock")]
    pub mock: bool,

    /// Talk to a real device even when AXE_MOCK is set
    #[arg(long, global = true)]
    pub no_mock: bool,

    /// Request timeout in seconds, not applied to OTA uploads [env: AXE_TIMEOUT_SECS]
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the device's system info
    Info {
        /// Print the raw JSON snapshot
        #[arg(long)]
        json: bool,
    },
    /// Restart the device
    Restart,
    /// Patch device configuration (applied after restart)
    Set(SetArgs),
    /// Upload a firmware image, or a web UI image with --www
    Ota {
        file: PathBuf,
        #[arg(long)]
        www: bool,
    },
    /// Clean device log lines read from stdin
    Logs {
        /// Apply the fixed-width frame trim instead of stripping escapes
        #[arg(long)]
        frame: bool,
    },
    /// Serve a mock device API over HTTP
    ServeMock {
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: SocketAddr,
        /// Artificial delay for info requests, in milliseconds
        #[arg(long, default_value_t = 0)]
        latency_ms: u64,
    },
}

#[derive(Debug, Default, Args)]
pub struct SetArgs {
    #[arg(long)]
    pub stratum_url: Option<String>,
    #[arg(long)]
    pub stratum_port: Option<u16>,
    #[arg(long)]
    pub stratum_user: Option<String>,
    #[arg(long)]
    pub stratum_password: Option<String>,
    #[arg(long)]
    pub ssid: Option<String>,
    #[arg(long)]
    pub wifi_pass: Option<String>,
    #[arg(long)]
    pub hostname: Option<String>,
    /// ASIC core voltage in millivolts
    #[arg(long)]
    pub core_voltage: Option<u32>,
    /// ASIC frequency in MHz
    #[arg(long)]
    pub frequency: Option<f64>,
    /// Manual fan duty in percent
    #[arg(long)]
    pub fan_speed: Option<u8>,
    #[arg(long)]
    pub auto_fan_speed: Option<bool>,
    /// Any other field, KEY=VALUE; VALUE is parsed as JSON when it can be
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub raw: Vec<String>,
}

impl Cli {
    /// Flags override the `AXE_*` environment.
    pub fn client_config(&self) -> CliResult<ClientConfig> {
        Ok(self.override_config(ClientConfig::from_env()?))
    }

    fn override_config(&self, mut cfg: ClientConfig) -> ClientConfig {
        if let Some(ref url) = self.url {
            cfg.base_url = url.clone();
        }
        if let Some(v) = self.api_version {
            cfg.api_version = v;
        }
        if self.mock {
            cfg.mock = true;
        } else if self.no_mock {
            cfg.mock = false;
        }
        if let Some(secs) = self.timeout {
            cfg.timeout = Duration::from_secs(secs);
        }
        cfg
    }
}

impl SetArgs {
    pub fn into_update(self) -> CliResult<SystemUpdate> {
        let mut update = SystemUpdate {
            stratum_url: self.stratum_url,
            stratum_port: self.stratum_port,
            stratum_user: self.stratum_user,
            stratum_password: self.stratum_password,
            ssid: self.ssid,
            wifi_pass: self.wifi_pass,
            hostname: self.hostname,
            core_voltage: self.core_voltage,
            frequency: self.frequency,
            manual_fan_speed: self.fan_speed,
            auto_fan_speed: self.auto_fan_speed.map(u8::from),
            ..Default::default()
        };
        for pair in self.raw {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", pair))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("empty key in {:?}", pair).into());
            }
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            update.extra.insert(key.to_string(), value);
        }
        // typed fields given through --set still land on their typed slot
        let update: SystemUpdate = serde_json::from_value(serde_json::to_value(&update)?)?;
        if update.is_empty() {
            return Err("nothing to update".into());
        }
        Ok(update)
    }
}

pub async fn run_info(api: &dyn SystemApi, json: bool, out: &mut impl Write) -> CliResult<()> {
    let info = api.get_info().await?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&info)?)?;
    } else {
        write_summary(&info, out)?;
    }
    Ok(())
}

pub async fn run_restart(api: &dyn SystemApi, out: &mut impl Write) -> CliResult<()> {
    let reply = api.restart().await?;
    writeln!(out, "{}", reply)?;
    Ok(())
}

pub async fn run_set(api: &dyn SystemApi, args: SetArgs, out: &mut impl Write) -> CliResult<()> {
    let update = args.into_update()?;
    api.update_system(&update).await?;
    writeln!(out, "updated; restart the device to apply")?;
    Ok(())
}

pub async fn run_ota(
    api: &dyn SystemApi,
    file: PathBuf,
    target: OtaTarget,
    out: &mut impl Write,
) -> CliResult<()> {
    let mut upload = api.ota_update(target, file);
    let mut last_logged = None;
    while let Some(event) = upload.next().await {
        match event? {
            OtaEvent::Sent { total } => tracing::info!(%target, bytes = total, "uploading"),
            ev @ OtaEvent::UploadProgress { .. } => {
                let pct = ev.percent().unwrap_or(0);
                if last_logged.map_or(true, |p: u8| pct >= p.saturating_add(10) || pct == 100) {
                    tracing::info!(percent = pct, "upload progress");
                    last_logged = Some(pct);
                }
            }
            OtaEvent::Response { body, .. } => writeln!(out, "{}", body)?,
        }
    }
    Ok(())
}

/// Copy log lines from `reader` to `writer`, cleaned one by one.
///
/// Serial captures are not always valid UTF-8; bad bytes become U+FFFD.
pub async fn clean_logs<R, W>(mut reader: R, mut writer: W, frame: bool) -> CliResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw).await? == 0 {
            break;
        }
        let mut bytes = raw.as_slice();
        if let Some(rest) = bytes.strip_suffix(b"\n") {
            bytes = rest.strip_suffix(b"\r").unwrap_or(rest);
        }
        let line = String::from_utf8_lossy(bytes);
        let cleaned = if frame {
            axe_ansi::trim_log_frame(&line)
        } else {
            axe_ansi::clean_log_line(&line)
        };
        writer.write_all(cleaned.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await?;
    Ok(())
}

pub fn format_uptime(secs: u64) -> String {
    let (d, h, m, s) = (secs / 86_400, secs / 3600 % 24, secs / 60 % 60, secs % 60);
    if d > 0 {
        format!("{}d {}h {}m {}s", d, h, m, s)
    } else if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

fn write_summary(info: &SystemInfo, out: &mut impl Write) -> std::io::Result<()> {
    let name = info.hostname.as_deref().unwrap_or("device");
    writeln!(out, "{:<11}{} ({})", "device", name, info.asic_model)?;
    if let Some(ref v) = info.version {
        writeln!(out, "{:<11}{}", "firmware", v)?;
    }
    writeln!(out, "{:<11}{:.2} GH/s", "hashrate", info.hash_rate)?;
    match info.efficiency_j_per_th() {
        Some(eff) => writeln!(out, "{:<11}{:.2} J/TH", "efficiency", eff)?,
        None => writeln!(out, "{:<11}-", "efficiency")?,
    }
    writeln!(
        out,
        "{:<11}{:.2} W at {:.2} V",
        "power",
        info.power,
        info.input_voltage_volts()
    )?;
    match info.core_voltage_actual {
        Some(actual) => writeln!(
            out,
            "{:<11}{} mV (measured {} mV)",
            "core",
            info.core_voltage,
            actual
        )?,
        None => writeln!(out, "{:<11}{} mV", "core", info.core_voltage)?,
    }
    if let Some(f) = info.frequency {
        writeln!(out, "{:<11}{} MHz", "frequency", f)?;
    }
    if let Some(t) = info.temp {
        match info.vr_temp {
            Some(vr) => writeln!(out, "{:<11}{:.1} °C (VR {:.1} °C)", "temp", t, vr)?,
            None => writeln!(out, "{:<11}{:.1} °C", "temp", t)?,
        }
    }
    match info.fan_rpm {
        Some(rpm) => writeln!(out, "{:<11}{} % ({} rpm)", "fan", info.fan_speed, rpm)?,
        None => writeln!(out, "{:<11}{} %", "fan", info.fan_speed)?,
    }
    writeln!(out, "{:<11}{} ({})", "wifi", info.wifi_state(), info.ssid)?;
    writeln!(
        out,
        "{:<11}{}:{} as {}",
        "pool", info.stratum_url, info.stratum_port, info.stratum_user
    )?;
    if let (Some(url), Some(port)) = (&info.fallback_stratum_url, info.fallback_stratum_port) {
        writeln!(out, "{:<11}{}:{}", "fallback", url, port)?;
    }
    writeln!(
        out,
        "{:<11}{} accepted / {} rejected",
        "shares", info.shares_accepted, info.shares_rejected
    )?;
    writeln!(out, "{:<11}{}", "best diff", info.best_diff)?;
    writeln!(out, "{:<11}{}", "uptime", format_uptime(info.uptime_seconds))?;
    Ok(())
}
