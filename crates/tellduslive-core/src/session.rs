//! Telldus session: transport, device snapshot and commands.
//!
//! A [`Session`] owns one transport and the last snapshot of devices and
//! sensors fetched through it. [`Session::update`] replaces the snapshot;
//! everything else reads from it. Devices handed out are copies, so callers
//! look a device up again by id after an update.

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use tellduslive_types::{Device, Method, Methods};

use crate::credentials::{Credentials, TransportKind};
use crate::error::{Error, Result};
use crate::listener::{Listener, resolve_gateway};
use crate::live::LiveTransport;
use crate::local::LocalTransport;
use crate::transport::{Params, Transport};
use crate::wire::{CommandStatus, DeviceList, RawDeviceInfo, SensorList};

#[derive(Debug, Clone, Default)]
struct Snapshot {
    devices: Vec<Device>,
    sensors: Vec<Device>,
}

/// A connection to Telldus Live or a local TellStick.
pub struct Session {
    transport: Box<dyn Transport>,
    snapshot: RwLock<Snapshot>,
    /// Serializes updates and commands.
    request_lock: Mutex<()>,
    listen_host: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.transport.base_url())
            .field("listen_host", &self.listen_host)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Validate `credentials` and build a session on the transport they
    /// select.
    ///
    /// Host and token without a public key select the local API; all four
    /// OAuth fields select Telldus Live. Anything else is
    /// [`Error::MissingConfiguration`].
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        let kind = credentials.validate()?;
        info!("{} version {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        let transport: Box<dyn Transport> = match kind {
            TransportKind::Local => Box::new(
                LocalTransport::connect(&field(&credentials.host), &field(&credentials.token))
                    .await?,
            ),
            TransportKind::Live => Box::new(LiveTransport::new(
                &field(&credentials.public_key),
                &field(&credentials.private_key),
                &field(&credentials.token),
                &field(&credentials.token_secret),
                credentials.application.clone(),
            )?),
        };
        debug!("Using {:?} transport at {}", kind, transport.base_url());

        let mut session = Self::with_boxed_transport(transport);
        if credentials.listen {
            session.listen_host = credentials.listen_host().map(str::to_string);
        }
        Ok(session)
    }

    /// Build a session on an existing transport, without a listener.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self::with_boxed_transport(Box::new(transport))
    }

    fn with_boxed_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            snapshot: RwLock::new(Snapshot::default()),
            request_lock: Mutex::new(()),
            listen_host: None,
        }
    }

    /// Register for pushed updates from `host` when [`listen`](Self::listen)
    /// is called.
    pub fn with_listen_host(mut self, host: impl Into<String>) -> Self {
        self.listen_host = Some(host.into());
        self
    }

    /// Gateway the listener registers with, if listening was requested.
    pub fn listen_host(&self) -> Option<&str> {
        self.listen_host.as_deref()
    }

    /// Start the push listener.
    ///
    /// Returns `None` when listening was not requested or no gateway is
    /// known.
    pub async fn listen(&self) -> Result<Option<Listener>> {
        let Some(host) = &self.listen_host else {
            return Ok(None);
        };
        let gateway = resolve_gateway(host).await?;
        Ok(Some(Listener::start(gateway).await?))
    }

    async fn request(&self, path: &str, params: &Params<'_>) -> Result<Value> {
        self.transport.maybe_refresh_token().await?;
        self.transport.get(path, params).await.inspect_err(|e| {
            warn!("Failed request: {}", e);
        })
    }

    async fn request_device_info(&self, id: &str) -> Result<RawDeviceInfo> {
        let body = self.request("device/info", &[("id", id.to_string())]).await?;
        serde_json::from_value(body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    /// Fetch devices and sensors and replace the snapshot.
    ///
    /// Protocol details of devices already in the snapshot are reused;
    /// new devices are looked up with `device/info`. Unnamed devices and
    /// sensors that never reported are dropped. On failure the previous
    /// snapshot is kept.
    pub async fn update(&self) -> Result<()> {
        let _guard = self.request_lock.lock().await;

        let body = self
            .request(
                "devices/list",
                &[
                    ("supportedMethods", Methods::SUPPORTED.bits().to_string()),
                    ("includeIgnored", "0".to_string()),
                ],
            )
            .await?;
        let listed: DeviceList =
            serde_json::from_value(body).map_err(|e| Error::InvalidResponse(e.to_string()))?;
        let listed = listed
            .device
            .ok_or_else(|| Error::InvalidResponse("devices/list returned no device list".into()))?;

        let known = self.snapshot.read().await.devices.clone();
        let mut devices = Vec::with_capacity(listed.len());
        for raw in listed {
            if raw.name.as_deref().unwrap_or_default().is_empty() {
                continue;
            }
            let info = match known.iter().find(|d| d.id == raw.id) {
                Some(device) => RawDeviceInfo::from_device(device),
                None => {
                    debug!("Getting protocol and parameters for new device {}", raw.id);
                    self.request_device_info(&raw.id).await?
                }
            };
            devices.push(raw.into_device(info));
        }

        let body = self
            .request(
                "sensors/list",
                &[
                    ("includeValues", "1".to_string()),
                    ("includeScale", "1".to_string()),
                    ("includeIgnored", "0".to_string()),
                ],
            )
            .await?;
        let listed: SensorList =
            serde_json::from_value(body).map_err(|e| Error::InvalidResponse(e.to_string()))?;
        let sensors: Vec<Device> = listed
            .sensor
            .ok_or_else(|| Error::InvalidResponse("sensors/list returned no sensor list".into()))?
            .into_iter()
            .filter(|s| !s.name.as_deref().unwrap_or_default().is_empty() && s.data.is_some())
            .map(|s| s.into_device())
            .collect();

        debug!("Updated {} devices and {} sensors", devices.len(), sensors.len());
        *self.snapshot.write().await = Snapshot { devices, sensors };
        Ok(())
    }

    /// All devices followed by all sensors.
    pub async fn devices(&self) -> Vec<Device> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .devices
            .iter()
            .chain(snapshot.sensors.iter())
            .cloned()
            .collect()
    }

    /// Sensors only.
    pub async fn sensors(&self) -> Vec<Device> {
        self.snapshot.read().await.sensors.clone()
    }

    /// The (non-sensor) device with the given id.
    pub async fn device(&self, id: &str) -> Option<Device> {
        self.snapshot
            .read()
            .await
            .devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// The sensor with the given id.
    pub async fn sensor(&self, id: &str) -> Option<Device> {
        self.snapshot
            .read()
            .await
            .sensors
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Send `method` to a device and record it as the device state.
    ///
    /// Succeeds only when the server answers `{"status": "success"}`.
    pub async fn execute(&self, device_id: &str, method: Method, extra: &Params<'_>) -> Result<()> {
        let _guard = self.request_lock.lock().await;

        let mut params = vec![("id", device_id.to_string())];
        params.extend(extra.iter().cloned());

        let path = format!("device/{}", method.api_name());
        let body = self.request(&path, &params).await?;
        let status: CommandStatus =
            serde_json::from_value(body).map_err(|e| Error::InvalidResponse(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::command_rejected(device_id, method.api_name()));
        }

        if let Some(device) = self
            .snapshot
            .write()
            .await
            .devices
            .iter_mut()
            .find(|d| d.id == device_id)
        {
            device.set_state(method);
        }
        Ok(())
    }

    pub async fn turn_on(&self, device_id: &str) -> Result<()> {
        self.execute(device_id, Method::TurnOn, &[]).await
    }

    pub async fn turn_off(&self, device_id: &str) -> Result<()> {
        self.execute(device_id, Method::TurnOff, &[]).await
    }

    /// Dim a device to `level` (0-255).
    pub async fn dim(&self, device_id: &str, level: u8) -> Result<()> {
        self.execute(device_id, Method::Dim, &[("level", level.to_string())])
            .await?;
        if let Some(device) = self
            .snapshot
            .write()
            .await
            .devices
            .iter_mut()
            .find(|d| d.id == device_id)
        {
            device.set_state_value(level.to_string());
        }
        Ok(())
    }

    pub async fn up(&self, device_id: &str) -> Result<()> {
        self.execute(device_id, Method::Up, &[]).await
    }

    pub async fn down(&self, device_id: &str) -> Result<()> {
        self.execute(device_id, Method::Down, &[]).await
    }

    pub async fn stop(&self, device_id: &str) -> Result<()> {
        self.execute(device_id, Method::Stop, &[]).await
    }
}
