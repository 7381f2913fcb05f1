/// Verified identity handed over by the external identity provider. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Provider-issued subject id.
    pub subject: String,
    pub display_name: Option<String>,
    /// Verified addresses only, in provider order.
    pub emails: Vec<String>,
}

impl ExternalIdentity {
    pub fn primary_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .map(|e| e.trim())
            .find(|e| !e.is_empty())
    }
}
