//! Wire schema of the random-profile endpoint and its mapping onto [`UserRecord`].

use serde::{Deserialize, Serialize};

use crate::{
    domain::{UserKey, UserRecord},
    error::ShapeError,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RandomUserResponse {
    #[serde(default)]
    pub results: Option<Vec<RawResult>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub login: Option<RawLogin>,
    #[serde(default)]
    pub name: Option<RawName>,
    #[serde(default)]
    pub picture: Option<RawPicture>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLogin {
    #[serde(default)]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawName {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPicture {
    #[serde(default)]
    pub large: Option<String>,
}

/// A remote result whose required fields have all been checked present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProfile {
    pub uuid: String,
    pub title: String,
    pub first: String,
    pub last: String,
    pub picture_large: String,
}

impl RawProfile {
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.title, self.first, self.last)
    }

    pub fn into_record(self) -> UserRecord {
        let name = self.display_name();
        UserRecord {
            id: UserKey(self.uuid),
            name,
            image: self.picture_large,
        }
    }
}

impl RawResult {
    fn validate(self, index: usize) -> Result<RawProfile, ShapeError> {
        let missing = |field: &'static str| ShapeError::MissingField { index, field };

        let uuid = self
            .login
            .and_then(|login| login.uuid)
            .ok_or_else(|| missing("login.uuid"))?;
        let name = self.name.ok_or_else(|| missing("name"))?;
        let title = name.title.ok_or_else(|| missing("name.title"))?;
        let first = name.first.ok_or_else(|| missing("name.first"))?;
        let last = name.last.ok_or_else(|| missing("name.last"))?;
        let picture_large = self
            .picture
            .and_then(|picture| picture.large)
            .ok_or_else(|| missing("picture.large"))?;

        Ok(RawProfile {
            uuid,
            title,
            first,
            last,
            picture_large,
        })
    }
}

impl RandomUserResponse {
    pub fn into_profiles(self) -> Result<Vec<RawProfile>, ShapeError> {
        self.results
            .ok_or(ShapeError::MissingResults)?
            .into_iter()
            .enumerate()
            .map(|(index, result)| result.validate(index))
            .collect()
    }
}

pub fn parse_profiles(body: &[u8]) -> Result<Vec<RawProfile>, ShapeError> {
    let response: RandomUserResponse =
        serde_json::from_slice(body).map_err(|err| ShapeError::InvalidJson(err.to_string()))?;
    response.into_profiles()
}

pub fn profiles_to_records(profiles: Vec<RawProfile>) -> Vec<UserRecord> {
    profiles.into_iter().map(RawProfile::into_record).collect()
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
