/// Login state of a browser session. There is no transition back to `LoggedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn,
}

impl SessionState {
    pub fn is_logged_in(self) -> bool {
        matches!(self, SessionState::LoggedIn)
    }
}
