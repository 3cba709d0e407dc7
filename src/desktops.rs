//! Desktops this installer knows how to provision.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::models::DesktopConfig;

static DESKTOPS: Lazy<BTreeMap<&'static str, DesktopConfig>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "plasma",
            DesktopConfig {
                packages: &[
                    "plasma-meta",
                    "kde-applications-meta",
                    "sddm",
                    "konsole",
                    "dolphin",
                    "audacity",
                    "qt6-multimedia-gstreamer",
                ],
                display_manager: "sddm",
            },
        ),
        (
            "gnome",
            DesktopConfig {
                packages: &["gnome", "gnome-tweaks", "gdm"],
                display_manager: "gdm",
            },
        ),
        (
            "cosmic",
            DesktopConfig {
                packages: &["cosmic", "cosmic-greeter"],
                display_manager: "cosmic-greeter",
            },
        ),
        (
            "xfce",
            DesktopConfig {
                packages: &[
                    "xfce4",
                    "xfce4-goodies",
                    "lightdm",
                    "lightdm-gtk-greeter",
                    "gvfs",
                    "feh",
                    "blueman",
                    "network-manager-applet",
                    "xfce4-terminal",
                    "thunar",
                ],
                display_manager: "lightdm",
            },
        ),
        (
            "lxqt",
            DesktopConfig {
                packages: &[
                    "lxqt",
                    "lightdm",
                    "lightdm-gtk-greeter",
                    "qterminal",
                    "gvfs",
                    "feh",
                    "blueman",
                    "xorg-xinit",
                    "network-manager-applet",
                    "pcmanfm-qt",
                ],
                display_manager: "lightdm",
            },
        ),
        (
            "mate",
            DesktopConfig {
                packages: &[
                    "mate",
                    "mate-extra",
                    "lightdm",
                    "lightdm-gtk-greeter",
                    "gvfs",
                    "feh",
                    "blueman",
                    "system-config-printer",
                    "xorg-xinit",
                    "network-manager-applet",
                ],
                display_manager: "lightdm",
            },
        ),
        (
            "hyprland",
            DesktopConfig {
                packages: &[
                    "hyprland",
                    "hyprcursor",
                    "hyprgraphics",
                    "hypridle",
                    "hyprland-protocols",
                    "hyprland-qt-support",
                    "hyprland-guiutils",
                    "hyprlang",
                    "hyprlauncher",
                    "hyprlock",
                    "hyprpaper",
                    "hyprpicker",
                    "hyprpolkitagent",
                    "hyprsunset",
                    "hyprutils",
                    "mako",
                    "wl-clipboard",
                    "cliphist",
                    "nwg-displays",
                    "nwg-dock-hyprland",
                    "nwg-panel",
                    "sddm",
                    "uwsm",
                    "kitty",
                    "libnewt",
                    "libnotify",
                    "wmenu",
                    "labwc",
                    "dolphin",
                    "xdg-desktop-portal",
                    "xdg-desktop-portal-hyprland",
                ],
                display_manager: "sddm",
            },
        ),
    ])
});

pub fn lookup(id: &str) -> Option<&'static DesktopConfig> {
    DESKTOPS.get(id)
}

pub fn contains(id: &str) -> bool {
    DESKTOPS.contains_key(id)
}

/// Every known desktop id, sorted.
pub fn ids() -> impl Iterator<Item = &'static str> {
    DESKTOPS.keys().copied()
}
