use std::collections::BTreeMap;

use serde::Deserialize;

/// Privacy bit of `NM80211ApFlags`.
pub const AP_FLAGS_PRIVACY: u32 = 0x1;

/// Packages and display manager installed for one desktop.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DesktopConfig {
    pub packages: &'static [&'static str],
    pub display_manager: &'static str,
}

/// A desktop offered to the user, as listed in the step configuration.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct DesktopChoice {
    pub id: String,
    pub name: String,
    pub description: String,
    pub screenshot: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccessPointInfo {
    pub path: String,
    pub ssid: String,
    pub strength: u8,
    pub flags: u32,
    pub wpa_flags: u32,
    pub rsn_flags: u32,
    pub secured: bool,
}

impl AccessPointInfo {
    pub fn new(
        path: impl Into<String>,
        ssid: impl Into<String>,
        strength: u8,
        flags: u32,
        wpa_flags: u32,
        rsn_flags: u32,
    ) -> Self {
        Self {
            path: path.into(),
            ssid: ssid.into(),
            strength,
            flags,
            wpa_flags,
            rsn_flags,
            secured: is_secured(flags, wpa_flags, rsn_flags),
        }
    }

    pub fn security_label(&self) -> &'static str {
        if self.secured { "Secured" } else { "Open" }
    }

    pub fn strength_bars(&self) -> &'static str {
        strength_bars(self.strength)
    }
}

pub fn is_secured(flags: u32, wpa_flags: u32, rsn_flags: u32) -> bool {
    flags & AP_FLAGS_PRIVACY != 0 || wpa_flags != 0 || rsn_flags != 0
}

pub fn strength_bars(strength: u8) -> &'static str {
    match strength {
        76..=u8::MAX => "\u{2582}\u{2584}\u{2586}\u{2588}",
        51..=75 => "\u{2582}\u{2584}\u{2586}",
        26..=50 => "\u{2582}\u{2584}",
        _ => "\u{2582}",
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConnectivityState {
    pub connected: bool,
    pub connection_name: Option<String>,
}

impl ConnectivityState {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn label(&self) -> String {
        match (self.connected, self.connection_name.as_deref()) {
            (false, _) => "Not connected".to_string(),
            (true, Some(name)) if !name.is_empty() => format!("Connected: {name}"),
            (true, _) => "Connected".to_string(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SettingValue {
    Str(String),
    Bytes(Vec<u8>),
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// Settings for `AddAndActivateConnection`, shaped like NetworkManager's
/// `a{sa{sv}}`: section name, then key, then value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConnectionSettings {
    sections: BTreeMap<String, BTreeMap<String, SettingValue>>,
}

impl ConnectionSettings {
    /// Infrastructure-mode wireless profile with automatic IPv4/IPv6.
    /// A pre-shared key adds a WPA-PSK security section.
    pub fn wireless(ssid: &str, psk: Option<&str>) -> Self {
        let mut settings = Self::default();

        settings.set("connection", "type", "802-11-wireless");
        settings.set("connection", "id", ssid);

        settings.set(
            "802-11-wireless",
            "ssid",
            SettingValue::Bytes(ssid.as_bytes().to_vec()),
        );
        settings.set("802-11-wireless", "mode", "infrastructure");

        if let Some(psk) = psk {
            settings.set("802-11-wireless", "security", "802-11-wireless-security");
            settings.set("802-11-wireless-security", "key-mgmt", "wpa-psk");
            settings.set("802-11-wireless-security", "psk", psk);
        }

        settings.set("ipv4", "method", "auto");
        settings.set("ipv6", "method", "auto");
        settings
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<SettingValue>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&SettingValue> {
        self.sections.get(section).and_then(|s| s.get(key))
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, SettingValue>)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }
}
