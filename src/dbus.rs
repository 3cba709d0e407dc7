use std::collections::HashMap;

use zbus::blocking::{Connection, Proxy};
use zvariant::{ObjectPath, OwnedObjectPath, Value};

use crate::error::{Error, Result};
use crate::models::{AccessPointInfo, ConnectionSettings, SettingValue};

const NM_SERVICE: &str = "org.freedesktop.NetworkManager";
const NM_PATH: &str = "/org/freedesktop/NetworkManager";
const NM_IFACE: &str = "org.freedesktop.NetworkManager";
const DEVICE_IFACE: &str = "org.freedesktop.NetworkManager.Device";
const WIRELESS_IFACE: &str = "org.freedesktop.NetworkManager.Device.Wireless";
const ACCESS_POINT_IFACE: &str = "org.freedesktop.NetworkManager.AccessPoint";
const ACTIVE_CONNECTION_IFACE: &str = "org.freedesktop.NetworkManager.Connection.Active";

/// `NM_DEVICE_TYPE_WIFI`
pub const DEVICE_TYPE_WIFI: u32 = 2;
/// `NM_DEVICE_STATE_ACTIVATED`
pub const DEVICE_STATE_ACTIVATED: u32 = 100;
/// `NM_CONNECTIVITY_FULL`
pub const CONNECTIVITY_FULL: u32 = 4;

/// The calls the network page makes against NetworkManager.
pub trait NetworkBackend {
    /// Object path of the first WiFi device, if any.
    fn wireless_device(&self) -> Result<Option<String>>;

    /// Asks the device to scan. Returns without waiting for the scan.
    fn request_scan(&self, device: &str) -> Result<()>;

    /// Access points the device currently knows about, unsorted.
    fn access_points(&self, device: &str) -> Result<Vec<AccessPointInfo>>;

    /// Global `Connectivity` property.
    fn connectivity(&self) -> Result<u32>;

    /// `Id` of the primary active connection.
    fn primary_connection_id(&self) -> Result<Option<String>>;

    /// Device `State` property.
    fn device_state(&self, device: &str) -> Result<u32>;

    /// SSID of the access point the device is associated with.
    fn active_access_point_ssid(&self, device: &str) -> Result<Option<String>>;

    fn add_and_activate_connection(
        &self,
        settings: &ConnectionSettings,
        device: &str,
        access_point: &str,
    ) -> Result<()>;
}

#[derive(Debug)]
pub struct NmDbus {
    conn: Option<Connection>,
}

impl NmDbus {
    /// Connects to the system bus. A missing bus is logged and every later
    /// call fails with [`Error::BusUnavailable`].
    pub fn new() -> Self {
        let conn = match Connection::system() {
            Ok(conn) => Some(conn),
            Err(err) => {
                tracing::warn!("D-Bus system bus not connected: {err}");
                None
            }
        };
        Self { conn }
    }

    fn proxy<'a>(&'a self, path: &'a str, interface: &'static str) -> Result<Proxy<'a>> {
        let conn = self.conn.as_ref().ok_or(Error::BusUnavailable)?;
        Ok(Proxy::new(conn, NM_SERVICE, path, interface)?)
    }

    fn read_ssid(&self, access_point: &str) -> Result<String> {
        let proxy = self.proxy(access_point, ACCESS_POINT_IFACE)?;
        let bytes: Vec<u8> = proxy.get_property("Ssid")?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Default for NmDbus {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkBackend for NmDbus {
    fn wireless_device(&self) -> Result<Option<String>> {
        let nm = self.proxy(NM_PATH, NM_IFACE)?;
        let devices: Vec<OwnedObjectPath> = nm.call("GetDevices", &())?;

        for device in devices {
            let proxy = self.proxy(device.as_str(), DEVICE_IFACE)?;
            if let Ok(DEVICE_TYPE_WIFI) = proxy.get_property::<u32>("DeviceType") {
                tracing::debug!(path = device.as_str(), "found wireless device");
                return Ok(Some(device.as_str().to_string()));
            }
        }

        Ok(None)
    }

    fn request_scan(&self, device: &str) -> Result<()> {
        let proxy = self.proxy(device, WIRELESS_IFACE)?;
        let options: HashMap<&str, Value<'_>> = HashMap::new();
        proxy.call_noreply("RequestScan", &(options,))?;
        Ok(())
    }

    fn access_points(&self, device: &str) -> Result<Vec<AccessPointInfo>> {
        let wireless = self.proxy(device, WIRELESS_IFACE)?;
        let paths: Vec<OwnedObjectPath> = wireless.call("GetAccessPoints", &())?;
        let mut out = Vec::with_capacity(paths.len());

        for path in paths {
            let proxy = self.proxy(path.as_str(), ACCESS_POINT_IFACE)?;

            let ssid: Vec<u8> = match proxy.get_property("Ssid") {
                Ok(v) => v,
                Err(err) => {
                    tracing::debug!(path = path.as_str(), "skipping access point: {err}");
                    continue;
                }
            };
            let ssid = String::from_utf8_lossy(&ssid).into_owned();
            if ssid.is_empty() {
                continue;
            }

            let strength: u8 = proxy.get_property("Strength").unwrap_or(0);
            let flags: u32 = proxy.get_property("Flags").unwrap_or(0);
            let wpa_flags: u32 = proxy.get_property("WpaFlags").unwrap_or(0);
            let rsn_flags: u32 = proxy.get_property("RsnFlags").unwrap_or(0);

            out.push(AccessPointInfo::new(
                path.as_str(),
                ssid,
                strength,
                flags,
                wpa_flags,
                rsn_flags,
            ));
        }

        Ok(out)
    }

    fn connectivity(&self) -> Result<u32> {
        let nm = self.proxy(NM_PATH, NM_IFACE)?;
        Ok(nm.get_property("Connectivity")?)
    }

    fn primary_connection_id(&self) -> Result<Option<String>> {
        let nm = self.proxy(NM_PATH, NM_IFACE)?;
        let primary: OwnedObjectPath = nm.get_property("PrimaryConnection")?;
        if primary.as_str() == "/" {
            return Ok(None);
        }

        let active = self.proxy(primary.as_str(), ACTIVE_CONNECTION_IFACE)?;
        let id: String = active.get_property("Id")?;
        Ok(Some(id))
    }

    fn device_state(&self, device: &str) -> Result<u32> {
        let proxy = self.proxy(device, DEVICE_IFACE)?;
        Ok(proxy.get_property("State")?)
    }

    fn active_access_point_ssid(&self, device: &str) -> Result<Option<String>> {
        let wireless = self.proxy(device, WIRELESS_IFACE)?;
        let ap: OwnedObjectPath = wireless.get_property("ActiveAccessPoint")?;
        if ap.as_str() == "/" {
            return Ok(None);
        }
        self.read_ssid(ap.as_str()).map(Some)
    }

    fn add_and_activate_connection(
        &self,
        settings: &ConnectionSettings,
        device: &str,
        access_point: &str,
    ) -> Result<()> {
        let nm = self.proxy(NM_PATH, NM_IFACE)?;

        let payload: HashMap<&str, HashMap<&str, Value<'_>>> = settings
            .sections()
            .map(|(section, values)| {
                let entries: HashMap<&str, Value<'_>> = values
                    .iter()
                    .map(|(key, value)| (key.as_str(), setting_value(value)))
                    .collect();
                (section, entries)
            })
            .collect();
        let device = ObjectPath::try_from(device)?;
        let access_point = ObjectPath::try_from(access_point)?;

        let (connection, active): (OwnedObjectPath, OwnedObjectPath) = nm.call(
            "AddAndActivateConnection",
            &(payload, device, access_point),
        )?;
        tracing::debug!(
            connection = connection.as_str(),
            active = active.as_str(),
            "connection activated"
        );
        Ok(())
    }
}

fn setting_value(value: &SettingValue) -> Value<'_> {
    match value {
        SettingValue::Str(s) => Value::from(s.as_str()),
        SettingValue::Bytes(b) => Value::from(b.clone()),
    }
}
