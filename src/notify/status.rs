//! Install status codes reported to the descriptor's notification URI.

use std::fmt;

/// A status code of the install notification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallStatus {
    Success,
    InsufficientMemory,
    UserCancelled,
    LossOfService,
    AttributeMismatch,
    InvalidDescriptor,
    InvalidDdVersion,
    DeviceAborted,
    NonAcceptableContent,
    LoaderError,
}

impl InstallStatus {
    /// Look up a status by its numeric code.
    pub fn from_code(code: u16) -> Option<Self> {
        let status = match code {
            900 => InstallStatus::Success,
            901 => InstallStatus::InsufficientMemory,
            902 => InstallStatus::UserCancelled,
            903 => InstallStatus::LossOfService,
            905 => InstallStatus::AttributeMismatch,
            906 => InstallStatus::InvalidDescriptor,
            951 => InstallStatus::InvalidDdVersion,
            952 => InstallStatus::DeviceAborted,
            953 => InstallStatus::NonAcceptableContent,
            954 => InstallStatus::LoaderError,
            _ => return None,
        };
        Some(status)
    }

    pub fn code(self) -> u16 {
        match self {
            InstallStatus::Success => 900,
            InstallStatus::InsufficientMemory => 901,
            InstallStatus::UserCancelled => 902,
            InstallStatus::LossOfService => 903,
            InstallStatus::AttributeMismatch => 905,
            InstallStatus::InvalidDescriptor => 906,
            InstallStatus::InvalidDdVersion => 951,
            InstallStatus::DeviceAborted => 952,
            InstallStatus::NonAcceptableContent => 953,
            InstallStatus::LoaderError => 954,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            InstallStatus::Success => "Success",
            InstallStatus::InsufficientMemory => "Insufficient memory",
            InstallStatus::UserCancelled => "User Cancelled",
            InstallStatus::LossOfService => "Loss of Service",
            InstallStatus::AttributeMismatch => "Attribute mismatch",
            InstallStatus::InvalidDescriptor => "Invalid descriptor",
            InstallStatus::InvalidDdVersion => "Invalid DDVersion",
            InstallStatus::DeviceAborted => "Device Aborted",
            InstallStatus::NonAcceptableContent => "Non-Acceptable Content",
            InstallStatus::LoaderError => "Loader Error",
        }
    }
}

/// The POST body: `"<code> <reason>"`.
impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// Build the notification body for a raw code.
///
/// Unrecognized codes produce an empty body.
pub fn notification_body(code: u16) -> String {
    InstallStatus::from_code(code)
        .map(|status| status.to_string())
        .unwrap_or_default()
}
