//! Compiled-in table of known pre-installed packages.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Risk of removing or disabling a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyLevel {
    Safe,
    Caution,
    Risky,
}

impl SafetyLevel {
    pub const ALL: [SafetyLevel; 3] = [Self::Safe, Self::Caution, Self::Risky];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Caution => "CAUTION",
            Self::Risky => "RISKY",
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SafetyLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown safety level '{value}' (expected SAFE, CAUTION or RISKY)"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Android_System")]
    AndroidSystem,
    Google,
    Xiaomi,
    Facebook,
    #[serde(rename = "Other_ThirdParty")]
    OtherThirdParty,
    #[serde(rename = "Manufacturer_Test")]
    ManufacturerTest,
    Game,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Self::AndroidSystem,
        Self::Google,
        Self::Xiaomi,
        Self::Facebook,
        Self::OtherThirdParty,
        Self::ManufacturerTest,
        Self::Game,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AndroidSystem => "Android_System",
            Self::Google => "Google",
            Self::Xiaomi => "Xiaomi",
            Self::Facebook => "Facebook",
            Self::OtherThirdParty => "Other_ThirdParty",
            Self::ManufacturerTest => "Manufacturer_Test",
            Self::Game => "Game",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown category '{value}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnownPackage {
    pub package_name: &'static str,
    pub description: &'static str,
    pub safety: SafetyLevel,
    pub category: Category,
}

const fn entry(
    package_name: &'static str,
    description: &'static str,
    safety: SafetyLevel,
    category: Category,
) -> KnownPackage {
    KnownPackage {
        package_name,
        description,
        safety,
        category,
    }
}

use Category::{AndroidSystem, Facebook, Game, Google, ManufacturerTest, OtherThirdParty, Xiaomi};
use SafetyLevel::{Caution, Risky, Safe};

static KNOWN_PACKAGES: &[KnownPackage] = &[
    entry("com.android.bluetoothmidiservice", "Bluetooth MIDI Service", Safe, AndroidSystem),
    entry("com.android.calllogbackup", "Android Call Log Backup Service", Safe, AndroidSystem),
    // Emergency alerts.
    entry("com.android.cellbroadcastreceiver", "Android Cell Broadcast Receiver (Emergency Alerts)", Caution, AndroidSystem),
    entry("com.android.cellbroadcastreceiver.overlay.common", "Overlay for Cell Broadcast Receiver", Caution, AndroidSystem),
    entry("com.android.dreams.basic", "Basic Screensaver", Safe, AndroidSystem),
    entry("com.android.dreams.phototable", "Photo Table Screensaver", Safe, AndroidSystem),
    entry("com.android.managedprovisioning", "Work Profile/Device Provisioning", Safe, AndroidSystem),
    entry("com.android.ons", "OMA Notification Service (Carrier)", Caution, AndroidSystem),
    entry("com.android.providers.calendar", "Android Calendar Storage", Risky, AndroidSystem),
    entry("com.android.providers.partnerbookmarks", "Partner Bookmarks Provider", Safe, AndroidSystem),
    entry("com.android.providers.userdictionary", "User Dictionary Storage", Safe, AndroidSystem),
    entry("com.android.sharedstoragebackup", "Shared Storage Backup Service", Safe, AndroidSystem),
    entry("com.android.smspush", "SMS Push Service (Carrier/Messaging)", Caution, AndroidSystem),
    entry("com.android.theme.font.notoserifsource", "Noto Serif Font", Safe, AndroidSystem),
    entry("com.android.traceur", "System Tracing Tool (Developer)", Safe, AndroidSystem),
    entry("com.android.wallpaperbackup", "Wallpaper Backup Service", Safe, AndroidSystem),
    entry("com.facebook.appmanager", "Facebook App Manager", Safe, Facebook),
    entry("com.facebook.katana", "Facebook App", Safe, Facebook),
    entry("com.facebook.services", "Facebook Services", Safe, Facebook),
    entry("com.facebook.system", "Facebook System", Safe, Facebook),
    entry("com.netflix.mediaclient", "Netflix App", Safe, OtherThirdParty),
    entry("com.spotify.music", "Spotify App", Safe, OtherThirdParty),
    entry("com.ss.android.ugc.trill", "TikTok App (Global)", Safe, OtherThirdParty),
    entry("org.ifaa.aidl.manager", "IFAA Service (Payment/Authentication)", Safe, OtherThirdParty),
    entry("com.fido.asm", "FIDO ASM (Authentication)", Safe, ManufacturerTest),
    entry("com.goodix.gftest", "Goodix Fingerprint Test", Safe, ManufacturerTest),
    entry("com.quicinc.voice.activation", "Qualcomm Voice Activation", Safe, ManufacturerTest),
    entry("com.longcheertel.AutoTest", "Longcheer Auto Test (Factory)", Safe, ManufacturerTest),
    entry("com.longcheertel.cit", "Longcheer CIT (Factory Test)", Safe, ManufacturerTest),
    entry("com.longcheertel.sarauth", "Longcheer SAR Auth (Factory)", Safe, ManufacturerTest),
    entry("com.google.android.apps.photos", "Google Photos App", Safe, Google),
    entry("com.google.android.apps.restore", "Google Restore", Safe, Google),
    entry("com.google.android.apps.subscriptions.red", "Google Subscriptions (YouTube Premium)", Safe, Google),
    entry("com.google.android.apps.tachyon", "Google Duo (Meet)", Safe, Google),
    entry("com.google.android.apps.turbo", "Device Health Services / Adaptive Battery", Risky, Google),
    entry("com.google.android.apps.wellbeing", "Digital Wellbeing", Safe, Google),
    entry("com.google.android.apps.youtube.music", "YouTube Music App", Safe, Google),
    entry("com.google.android.as", "Android System Intelligence", Caution, Google),
    entry("com.google.android.as.oss", "Android System Intelligence OSS", Caution, Google),
    entry("com.google.android.cellbroadcastreceiver", "Google Cell Broadcast Receiver", Caution, Google),
    entry("com.google.android.cellbroadcastservice", "Google Cell Broadcast Service", Caution, Google),
    entry("com.google.android.feedback", "Google Feedback Service", Safe, Google),
    entry("com.google.android.gms.location.history", "Google Location History", Safe, Google),
    entry("com.google.android.gms.supervision", "Google Family Link (Supervision)", Safe, Google),
    entry("com.google.android.googlequicksearchbox", "Google App / Search / Assistant", Caution, Google),
    // Breaks VoLTE/VoWiFi calling.
    entry("com.google.android.ims", "IMS Service (VoLTE/VoWiFi)", Risky, Google),
    entry("com.google.android.marvin.talkback", "TalkBack (Accessibility)", Safe, Google),
    entry("com.google.android.onetimeinitializer", "One Time Initializer", Safe, Google),
    entry("com.google.android.partnersetup", "Partner Setup", Safe, Google),
    entry("com.google.android.printservice.recommendation", "Print Service Recommendation", Safe, Google),
    entry("com.google.android.projection.gearhead", "Android Auto", Safe, Google),
    entry("com.google.android.syncadapters.calendar", "Google Calendar Sync", Caution, Google),
    entry("com.google.android.tts", "Google Text-to-speech", Safe, Google),
    entry("com.google.android.videos", "Google TV (Play Movies)", Safe, Google),
    entry("com.google.android.youtube", "YouTube App", Safe, Google),
    entry("android.autoinstalls.config.Xiaomi.model", "Xiaomi Auto Installs Config", Safe, Xiaomi),
    entry("com.mi.globalbrowser", "Mi Browser (Global)", Safe, Xiaomi),
    entry("com.mi.globalminusscreen", "App Vault", Safe, Xiaomi),
    entry("com.miui.analytics", "MIUI/HyperOS Analytics", Safe, Xiaomi),
    entry("com.miui.audioeffect", "MIUI/HyperOS Audio Effects", Safe, Xiaomi),
    entry("com.miui.audiomonitor", "MIUI/HyperOS Audio Monitor", Safe, Xiaomi),
    entry("com.miui.backup", "MIUI/HyperOS Backup", Safe, Xiaomi),
    entry("com.miui.bugreport", "MIUI/HyperOS Bug Report", Safe, Xiaomi),
    entry("com.miui.cleaner", "MIUI/HyperOS Cleaner", Safe, Xiaomi),
    entry("com.miui.cloudbackup", "Mi Cloud Backup", Safe, Xiaomi),
    entry("com.miui.cloudservice", "Mi Cloud Services", Safe, Xiaomi),
    entry("com.miui.daemon", "MIUI/HyperOS Daemon", Risky, Xiaomi),
    // Removing the installer leaves the phone unable to install updates.
    entry("com.miui.global.packageinstaller", "MIUI/HyperOS Package Installer", Risky, Xiaomi),
    entry("com.miui.micloudsync", "Mi Cloud Sync", Safe, Xiaomi),
    entry("com.miui.miservice", "Mi Service / Xiaomi Service", Safe, Xiaomi),
    entry("com.miui.msa.global", "MSA (MIUI System Ads - Global)", Safe, Xiaomi),
    entry("com.miui.phrase", "Quick Phrases / Smart Assistant", Safe, Xiaomi),
    entry("com.miui.yellowpage", "Yellow Pages / Dialer Features", Safe, Xiaomi),
    entry("com.xiaomi.calendar", "Xiaomi Calendar App", Safe, Xiaomi),
    entry("com.xiaomi.glgm", "Xiaomi Game Center / Service", Safe, Game),
    entry("com.xiaomi.mipicks", "GetApps (Xiaomi App Store)", Safe, Xiaomi),
    entry("com.xiaomi.mircs", "Mi RCS Service", Caution, Xiaomi),
    entry("com.xiaomi.mtb", "Mi Telephony/Messaging Component", Caution, Xiaomi),
    entry("com.xiaomi.payment", "Xiaomi Payment / Mi Pay", Safe, Xiaomi),
    entry("com.xiaomi.simactivate.service", "SIM Activation Service", Safe, Xiaomi),
    // Mi Account and push notifications depend on these two.
    entry("com.xiaomi.xmsf", "Xiaomi Messaging Framework (Core)", Risky, Xiaomi),
    entry("com.xiaomi.xmsfkeeper", "Xiaomi Messaging Framework Keeper", Risky, Xiaomi),
];

fn index() -> &'static HashMap<&'static str, &'static KnownPackage> {
    static INDEX: OnceLock<HashMap<&'static str, &'static KnownPackage>> = OnceLock::new();
    INDEX.get_or_init(|| {
        KNOWN_PACKAGES
            .iter()
            .map(|entry| (entry.package_name, entry))
            .collect()
    })
}

pub fn known_packages() -> &'static [KnownPackage] {
    KNOWN_PACKAGES
}

pub fn lookup(package_name: &str) -> Option<&'static KnownPackage> {
    index().get(package_name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn package_names_are_unique() {
        let names: HashSet<_> = known_packages().iter().map(|entry| entry.package_name).collect();
        assert_eq!(names.len(), known_packages().len());
        assert_eq!(index().len(), known_packages().len());
    }

    #[test]
    fn looks_up_entries() {
        let entry = lookup("com.miui.msa.global").expect("known");
        assert_eq!(entry.safety, SafetyLevel::Safe);
        assert_eq!(entry.category, Category::Xiaomi);
        assert!(lookup("com.example.unknown").is_none());
    }

    #[test]
    fn parses_filter_values() {
        assert_eq!("risky".parse::<SafetyLevel>(), Ok(SafetyLevel::Risky));
        assert!("GAME".parse::<SafetyLevel>().is_err());
        assert_eq!("other-thirdparty".parse::<Category>(), Ok(Category::OtherThirdParty));
        assert_eq!("android_system".parse::<Category>(), Ok(Category::AndroidSystem));
    }

    #[test]
    fn serializes_with_display_names() {
        let value = serde_json::to_value(lookup("com.android.traceur").expect("known")).expect("json");
        assert_eq!(value["safety"], "SAFE");
        assert_eq!(value["category"], "Android_System");
    }
}
