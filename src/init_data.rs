//! Launch data signed by the host (`tgWebAppData`).
//!
//! See <https://core.telegram.org/bots/webapps#webappinitdata> for the
//! meaning of every field.

use chrono::{DateTime, Utc};

use crate::{
    error::ParseError,
    location::{parse_query_string, SearchParams},
    parsing::{json, parse, search_params, Fields, JsonObject, Schema},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub is_bot: Option<bool>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub is_premium: Option<bool>,
    pub photo_url: Option<String>,
}

impl Schema<JsonObject> for User {
    fn from_fields(f: &Fields<'_, JsonObject>) -> Result<Self, ParseError> {
        Ok(User {
            id: f.field("id", json::int)?,
            is_bot: f.field("is_bot", json::opt_boolean)?,
            first_name: f.field("first_name", json::string)?,
            last_name: f.field("last_name", json::opt_string)?,
            username: f.field("username", json::opt_string)?,
            language_code: f.field("language_code", json::opt_string)?,
            is_premium: f.field("is_premium", json::opt_boolean)?,
            photo_url: f.field("photo_url", json::opt_string)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub chat_type: String,
    pub title: String,
    pub username: Option<String>,
    pub photo_url: Option<String>,
}

impl Schema<JsonObject> for Chat {
    fn from_fields(f: &Fields<'_, JsonObject>) -> Result<Self, ParseError> {
        Ok(Chat {
            id: f.field("id", json::int)?,
            chat_type: f.field("type", json::string)?,
            title: f.field("title", json::string)?,
            username: f.field("username", json::opt_string)?,
            photo_url: f.field("photo_url", json::opt_string)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InitDataFields {
    query_id: Option<String>,
    user: Option<User>,
    receiver: Option<User>,
    chat: Option<Chat>,
    start_param: Option<String>,
    can_send_after: Option<DateTime<Utc>>,
    auth_date: DateTime<Utc>,
    hash: String,
}

impl Schema<SearchParams> for InitDataFields {
    fn from_fields(f: &Fields<'_, SearchParams>) -> Result<Self, ParseError> {
        Ok(InitDataFields {
            query_id: f.field("query_id", search_params::opt_string)?,
            user: f.field("user", search_params::opt_json_struct)?,
            receiver: f.field("receiver", search_params::opt_json_struct)?,
            chat: f.field("chat", search_params::opt_json_struct)?,
            start_param: f.field("start_param", search_params::opt_string)?,
            can_send_after: f.field("can_send_after", search_params::opt_date)?,
            auth_date: f.field("auth_date", search_params::date)?,
            hash: f.field("hash", search_params::string)?,
        })
    }
}

/// Parsed launch data.
#[derive(Debug, Clone, PartialEq)]
pub struct InitData {
    raw: String,
    unchecked: JsonObject,
    fields: InitDataFields,
}

impl InitData {
    /// Placeholder used before the real launch data is known.
    pub fn empty() -> Self {
        Self {
            raw: String::new(),
            unchecked: JsonObject::new(),
            fields: InitDataFields {
                query_id: None,
                user: None,
                receiver: None,
                chat: None,
                start_param: None,
                can_send_after: None,
                auth_date: DateTime::<Utc>::UNIX_EPOCH,
                hash: String::new(),
            },
        }
    }

    /// Parses the query-string form sent by the host.
    ///
    /// ```
    /// use twa_bridge::InitData;
    ///
    /// let data = InitData::from_raw("auth_date=1700000000&hash=abc").unwrap();
    /// assert_eq!(data.hash(), "abc");
    /// assert!(data.user().is_none());
    /// ```
    pub fn from_raw(raw: &str) -> Result<Self, ParseError> {
        let fields = parse(&SearchParams::parse(raw))?;
        Ok(Self {
            raw: raw.to_string(),
            unchecked: parse_query_string(raw),
            fields,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Loosely typed decode of every parameter, including unknown ones.
    pub fn unchecked(&self) -> &JsonObject {
        &self.unchecked
    }

    pub fn query_id(&self) -> Option<&str> {
        self.fields.query_id.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.fields.user.as_ref()
    }

    pub fn receiver(&self) -> Option<&User> {
        self.fields.receiver.as_ref()
    }

    pub fn chat(&self) -> Option<&Chat> {
        self.fields.chat.as_ref()
    }

    pub fn start_param(&self) -> Option<&str> {
        self.fields.start_param.as_deref()
    }

    pub fn can_send_after(&self) -> Option<DateTime<Utc>> {
        self.fields.can_send_after
    }

    pub fn auth_date(&self) -> DateTime<Utc> {
        self.fields.auth_date
    }

    pub fn hash(&self) -> &str {
        &self.fields.hash
    }
}
