//! Profile resolution and connection opening.
//!
//! A [`Connector`] turns a profile name into an open [`Session`]: it loads the
//! profile, fetches the password from the secret store, renders the ODBC
//! connection string and asks the driver for a connection and a cursor.

use crate::db::driver::{Connection, Cursor, Driver};
use crate::error::{DbError, DbResult};
use crate::models::ConnectionProfile;
use crate::store::{ProfileStore, SecretKey, SecretStore};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default login timeout passed to the driver, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Rendered form of a profile plus its password.
///
/// `Debug` output redacts the password.
#[derive(Clone)]
pub struct ConnectionString {
    driver: String,
    server: String,
    database: String,
    username: String,
    password: String,
    timeout_secs: u64,
}

impl ConnectionString {
    pub fn new(profile: &ConnectionProfile, password: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            driver: profile.driver.clone(),
            server: profile.server.clone(),
            database: profile.database.clone(),
            username: profile.username.clone(),
            password: password.into(),
            timeout_secs,
        }
    }

    /// `DRIVER=..;SERVER=..;DATABASE=..;UID=..;PWD=..;timeout=30;`
    pub fn render(&self) -> String {
        format!(
            "DRIVER={};SERVER={};DATABASE={};UID={};PWD={};timeout={};",
            escape_value(&self.driver),
            escape_value(&self.server),
            escape_value(&self.database),
            escape_value(&self.username),
            escape_value(&self.password),
            self.timeout_secs,
        )
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("driver", &self.driver)
            .field("server", &self.server)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Brace-quote a value that would otherwise break the `key=value;` grammar.
fn escape_value(value: &str) -> Cow<'_, str> {
    if is_braced_token(value) {
        return Cow::Borrowed(value);
    }
    let needs_quoting = value.contains([';', '{', '}'])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);
    if needs_quoting {
        Cow::Owned(format!("{{{}}}", value.replace('}', "}}")))
    } else {
        Cow::Borrowed(value)
    }
}

/// `{...}` whose inner `}` characters all come in doubled pairs.
fn is_braced_token(value: &str) -> bool {
    let Some(inner) = value
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return false;
    };
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '}' && chars.next() != Some('}') {
            return false;
        }
    }
    true
}

/// An open connection and its cursor, owned by a single tool call.
pub struct Session {
    connection: Box<dyn Connection>,
    cursor: Box<dyn Cursor>,
}

impl Session {
    pub fn cursor(&mut self) -> &mut dyn Cursor {
        self.cursor.as_mut()
    }

    pub fn commit(&mut self) -> DbResult<()> {
        self.connection.commit()
    }

    /// Roll back, logging instead of surfacing a failure.
    pub fn rollback_quietly(&mut self) {
        match self.connection.rollback() {
            Ok(()) => debug!("Transaction rolled back"),
            Err(e) => warn!(error = %e, "Rollback failed"),
        }
    }

    /// Close the cursor, then the connection. Failures are logged.
    pub fn release(self) {
        if let Err(e) = self.cursor.close() {
            warn!(error = %e, "Failed to close cursor");
        }
        if let Err(e) = self.connection.close() {
            warn!(error = %e, "Failed to close connection");
        }
    }
}

/// Resolves profiles and opens sessions. Every method blocks.
#[derive(Clone)]
pub struct Connector {
    profiles: Arc<dyn ProfileStore>,
    secrets: Arc<dyn SecretStore>,
    driver: Arc<dyn Driver>,
    timeout_secs: u64,
}

impl Connector {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        secrets: Arc<dyn SecretStore>,
        driver: Arc<dyn Driver>,
    ) -> Self {
        Self {
            profiles,
            secrets,
            driver,
            timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    pub fn with_connect_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        &self.profiles
    }

    pub fn secrets(&self) -> &Arc<dyn SecretStore> {
        &self.secrets
    }

    /// Load a profile and check that every key is present.
    pub fn resolve_profile(&self, name: &str) -> DbResult<ConnectionProfile> {
        let stored = self
            .profiles
            .get(name)?
            .ok_or_else(|| DbError::profile_not_found(name))?;
        ConnectionProfile::from_stored(name, stored)
    }

    /// Resolve a profile and its password into a connection string.
    pub fn connection_string(&self, name: &str) -> DbResult<ConnectionString> {
        let profile = self.resolve_profile(name)?;
        let key = SecretKey::new(&profile.name, &profile.username);
        let password = self
            .secrets
            .get(&key)?
            .ok_or_else(|| DbError::secret_not_found(&profile.name, &profile.username))?;
        Ok(ConnectionString::new(&profile, password, self.timeout_secs))
    }

    /// Open a connection and a cursor for `name`.
    ///
    /// If the cursor cannot be created the connection is closed before the
    /// error is returned.
    pub fn open_session(&self, name: &str) -> DbResult<Session> {
        let conn_str = self.connection_string(name)?;
        info!(
            profile = %name,
            server = %conn_str.server,
            database = %conn_str.database,
            "Connecting"
        );

        let mut connection = self.driver.connect(&conn_str.render())?;
        match connection.cursor() {
            Ok(cursor) => Ok(Session { connection, cursor }),
            Err(e) => {
                if let Err(close_err) = connection.close() {
                    warn!(error = %close_err, "Failed to close connection");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ConnectionProfile {
        ConnectionProfile::new(
            "prod",
            "{ODBC Driver 18 for SQL Server}",
            "db.example.com,1433",
            "Sales",
            "reporter",
        )
    }

    #[test]
    fn test_render() {
        let cs = ConnectionString::new(&profile(), "hunter2", 30);
        assert_eq!(
            cs.render(),
            "DRIVER={ODBC Driver 18 for SQL Server};SERVER=db.example.com,1433;DATABASE=Sales;UID=reporter;PWD=hunter2;timeout=30;"
        );
    }

    #[test]
    fn test_render_quotes_special_values() {
        let cs = ConnectionString::new(&profile(), "pa;ss}word", 5);
        assert!(cs.render().contains("PWD={pa;ss}}word};"));
        assert!(cs.render().ends_with("timeout=5;"));

        let cs = ConnectionString::new(&profile(), " padded", 30);
        assert!(cs.render().contains("PWD={ padded};"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let cs = ConnectionString::new(&profile(), "hunter2", 30);
        let debug = format!("{cs:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("plain"), "plain");
        assert_eq!(escape_value("{already}"), "{already}");
        assert_eq!(escape_value("a;b"), "{a;b}");
        assert_eq!(escape_value("trailing "), "{trailing }");
        assert_eq!(escape_value("{a}}b}"), "{a}}b}");
    }

    #[test]
    fn test_braced_password_cannot_add_keys() {
        let cs = ConnectionString::new(&profile(), "{x};DATABASE=master;UID={sa}", 30);
        assert_eq!(
            cs.render(),
            "DRIVER={ODBC Driver 18 for SQL Server};SERVER=db.example.com,1433;DATABASE=Sales;UID=reporter;PWD={{x}};DATABASE=master;UID={sa}}};timeout=30;"
        );
    }
}
