use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    NoPage,
    PortalRejected,
    EmptyDocument,
    NoResultData,
    FlowFallbackUsed,
    DuplicateUsn,
    MissingColumns,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractWarning {
    pub code: WarningCode,
    pub message: String,
    pub usn: Option<String>,
}

impl ExtractWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            usn: None,
        }
    }

    #[must_use]
    pub fn with_usn(mut self, usn: impl Into<String>) -> Self {
        self.usn = Some(usn.into());
        self
    }
}
