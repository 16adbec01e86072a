use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Both tables below are named `users`; they live in different databases.
pub const USERS_TABLE: &str = "users";

/// Maximum length of every VARCHAR column of the authentication `users` table.
pub const MAX_COLUMN_LEN: usize = 250;

// ============================================================
// Personal data database
// ============================================================

/// One row of the personal data `users` table. Every column is nullable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct PersonalDataRow {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub ssn: Option<String>,
    pub password: Option<String>,
    pub ip: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub user_agent: Option<String>,
}

impl PersonalDataRow {
    /// Render the row as a `key=value; ...;` log message. NULL columns render empty.
    pub fn to_log_message(&self) -> String {
        let last_login = self
            .last_login
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string());

        let columns = [
            ("name", self.name.as_deref()),
            ("email", self.email.as_deref()),
            ("phone", self.phone.as_deref()),
            ("ssn", self.ssn.as_deref()),
            ("password", self.password.as_deref()),
            ("ip", self.ip.as_deref()),
            ("last_login", last_login.as_deref()),
            ("user_agent", self.user_agent.as_deref()),
        ];

        columns
            .iter()
            .map(|(key, value)| format!("{}={};", key, value.unwrap_or("")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ============================================================
// Authentication database
// ============================================================

/// A row of the authentication `users` table.
///
/// ```sql
/// id              INTEGER PRIMARY KEY
/// email           VARCHAR(250) NOT NULL
/// hashed_password VARCHAR(250) NOT NULL
/// session_id      VARCHAR(250) NULL
/// reset_token     VARCHAR(250) NULL
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub hashed_password: String,
    pub session_id: Option<String>,
    pub reset_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_message_lists_every_column() {
        let row = PersonalDataRow {
            name: Some("Marlene Wood".to_string()),
            email: Some("hwestiii@att.net".to_string()),
            phone: Some("(473) 401-4253".to_string()),
            ssn: Some("261-72-6780".to_string()),
            password: Some("K5?BMNv".to_string()),
            ip: Some("60ed:c396:2ff:244:bbd0:9208:26f2:93ea".to_string()),
            last_login: Some(Utc.with_ymd_and_hms(2019, 6, 5, 8, 10, 57).unwrap()),
            user_agent: Some("Mozilla/5.0 (Windows NT 6.1)".to_string()),
        };

        assert_eq!(
            row.to_log_message(),
            "name=Marlene Wood; email=hwestiii@att.net; phone=(473) 401-4253; \
             ssn=261-72-6780; password=K5?BMNv; ip=60ed:c396:2ff:244:bbd0:9208:26f2:93ea; \
             last_login=2019-06-05 08:10:57; user_agent=Mozilla/5.0 (Windows NT 6.1);"
        );
    }

    #[test]
    fn test_null_columns_render_empty() {
        let row = PersonalDataRow {
            ip: Some("10.0.0.1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            row.to_log_message(),
            "name=; email=; phone=; ssn=; password=; ip=10.0.0.1; last_login=; user_agent=;"
        );
    }

    #[test]
    fn test_separator_inside_value_ends_redaction() {
        let row = PersonalDataRow {
            name: Some("Bob".to_string()),
            email: Some("bob@x.com".to_string()),
            password: Some("a;b".to_string()),
            ..Default::default()
        };
        let formatter = pd_core::RedactingFormatter::pii().unwrap();
        let record = pd_core::LogRecord::new("user_data", pd_core::Level::Info, row.to_log_message());
        let line = formatter.format(&record);
        assert!(line.ends_with(
            ": name=***; email=***; phone=***; ssn=***; password=***;b; ip=; last_login=; user_agent=;"
        ));
    }
}
