//! The fixed set of host capabilities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompatError;
use crate::version::SemVer;

/// A single host-exposed action or permission.
///
/// The set is closed and fixed at compile time. [`Capability::ALL`] lists it
/// in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Open a URL outside the mini-app.
    OpenExternalUrl,
    /// Share a URL through the host's composer.
    ShareUrl,
    /// Receive push notifications through the host.
    PushNotifications,
    /// An injected Ethereum provider.
    EthereumProvider,
    /// Write to the system clipboard.
    Clipboard,
    /// Scan a QR code.
    QrCode,
    /// Biometric confirmation.
    Biometrics,
    /// Haptic feedback.
    Haptics,
    /// Camera access.
    Camera,
    /// Device location.
    Location,
    /// Address book access.
    Contacts,
    /// Host-managed persistent storage.
    Storage,
    /// EIP-712 typed data signing.
    TypedDataSigning,
    /// Sending wallet transactions.
    TransactionSending,
}

impl Capability {
    /// Every capability, in registry order.
    pub const ALL: [Self; 14] = [
        Self::OpenExternalUrl,
        Self::ShareUrl,
        Self::PushNotifications,
        Self::EthereumProvider,
        Self::Clipboard,
        Self::QrCode,
        Self::Biometrics,
        Self::Haptics,
        Self::Camera,
        Self::Location,
        Self::Contacts,
        Self::Storage,
        Self::TypedDataSigning,
        Self::TransactionSending,
    ];

    /// Stable kebab-case identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenExternalUrl => "open-external-url",
            Self::ShareUrl => "share-url",
            Self::PushNotifications => "push-notifications",
            Self::EthereumProvider => "ethereum-provider",
            Self::Clipboard => "clipboard",
            Self::QrCode => "qr-code",
            Self::Biometrics => "biometrics",
            Self::Haptics => "haptics",
            Self::Camera => "camera",
            Self::Location => "location",
            Self::Contacts => "contacts",
            Self::Storage => "storage",
            Self::TypedDataSigning => "typed-data-signing",
            Self::TransactionSending => "transaction-sending",
        }
    }

    /// The host action whose presence implies this capability.
    ///
    /// `None` means there is no reliable heuristic. Those capabilities stay
    /// unsupported unless the host answers a native capability query.
    #[must_use]
    pub const fn heuristic_action(&self) -> Option<HostAction> {
        match self {
            Self::OpenExternalUrl => Some(HostAction::OpenUrl),
            Self::ShareUrl => Some(HostAction::ComposeCast),
            Self::PushNotifications => Some(HostAction::AddMiniApp),
            Self::EthereumProvider => Some(HostAction::EthereumProvider),
            Self::Clipboard => Some(HostAction::ClipboardWrite),
            Self::QrCode => Some(HostAction::ScanQrCode),
            Self::Biometrics => Some(HostAction::BiometricPrompt),
            Self::Haptics => Some(HostAction::HapticFeedback),
            Self::TypedDataSigning => Some(HostAction::SignTypedData),
            Self::TransactionSending => Some(HostAction::SendTransaction),
            Self::Camera | Self::Location | Self::Contacts | Self::Storage => None,
        }
    }

    /// Minimum host SDK version for version-gated capabilities.
    #[must_use]
    pub const fn min_version(&self) -> Option<SemVer> {
        match self {
            Self::TypedDataSigning | Self::TransactionSending => Some(SemVer::new(0, 1, 0)),
            Self::Haptics | Self::Biometrics => Some(SemVer::new(0, 2, 0)),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = CompatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cap| cap.as_str() == s)
            .ok_or_else(|| CompatError::UnknownIdentifier {
                kind: "capability",
                name: s.to_string(),
            })
    }
}

/// A concrete action a host may expose.
///
/// Hosts that offer no capability query are probed for these instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostAction {
    /// `openUrl`-style navigation.
    OpenUrl,
    /// Compose a post with embedded URLs.
    ComposeCast,
    /// Prompt the user to add the mini-app (enables notifications).
    AddMiniApp,
    /// An injected EIP-1193 provider.
    EthereumProvider,
    /// Clipboard write.
    ClipboardWrite,
    /// QR code scanner.
    ScanQrCode,
    /// Biometric prompt.
    BiometricPrompt,
    /// Haptic feedback trigger.
    HapticFeedback,
    /// `eth_signTypedData_v4`.
    SignTypedData,
    /// `eth_sendTransaction`.
    SendTransaction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip_through_from_str() {
        for cap in Capability::ALL {
            assert_eq!(cap.as_str().parse::<Capability>().unwrap(), cap);
        }
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&Capability::TypedDataSigning).unwrap();
        assert_eq!(json, "\"typed-data-signing\"");
        assert_eq!(
            json.trim_matches('"'),
            Capability::TypedDataSigning.as_str()
        );
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "teleport".parse::<Capability>().unwrap_err();
        assert!(matches!(
            err,
            CompatError::UnknownIdentifier { kind: "capability", .. }
        ));
    }

    #[test]
    fn capabilities_without_heuristic() {
        let without: Vec<Capability> = Capability::ALL
            .into_iter()
            .filter(|c| c.heuristic_action().is_none())
            .collect();
        assert_eq!(
            without,
            vec![
                Capability::Camera,
                Capability::Location,
                Capability::Contacts,
                Capability::Storage
            ]
        );
    }
}
