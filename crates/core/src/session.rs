//! Session state threaded through the lookup workflow.
//!
//! A `SessionState` is a plain value. Steps never mutate one in place; they
//! take the current value and hand back its successor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{CaptchaImage, Complex, Credential, District};

/// Selections in dependency order. Changing one invalidates everything after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    State,
    District,
    Complex,
    Establishment,
    Captcha,
}

impl Field {
    pub const ORDER: [Field; 5] = [
        Field::State,
        Field::District,
        Field::Complex,
        Field::Establishment,
        Field::Captcha,
    ];

    /// Fields strictly after `self`.
    pub fn downstream(self) -> impl Iterator<Item = Field> {
        Self::ORDER.into_iter().filter(move |f| *f > self)
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::State => "state code",
            Field::District => "district code",
            Field::Complex => "court complex code",
            Field::Establishment => "establishment code",
            Field::Captcha => "captcha",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps blank input to "not selected".
pub fn normalize_code(code: Option<&str>) -> Option<String> {
    code.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selections {
    pub state_code: Option<String>,
    pub dist_code: Option<String>,
    pub complex_code: Option<String>,
    pub est_code: Option<String>,
}

impl Selections {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::State => self.state_code.as_deref(),
            Field::District => self.dist_code.as_deref(),
            Field::Complex => self.complex_code.as_deref(),
            Field::Establishment => self.est_code.as_deref(),
            Field::Captcha => None,
        }
    }

    fn slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::State => Some(&mut self.state_code),
            Field::District => Some(&mut self.dist_code),
            Field::Complex => Some(&mut self.complex_code),
            Field::Establishment => Some(&mut self.est_code),
            Field::Captcha => None,
        }
    }
}

/// Partial update merged by [`SessionState::update`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub credential: Option<Credential>,
    pub state_code: Option<String>,
    pub dist_code: Option<String>,
    pub complex_code: Option<String>,
    pub est_code: Option<String>,
    pub districts: Option<Vec<District>>,
    pub complexes: Option<Vec<Complex>>,
    pub location: Option<Value>,
    pub captcha: Option<CaptchaImage>,
    pub results: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub credential: Option<Credential>,
    pub selections: Selections,
    /// `None` until a district listing succeeds for the selected state.
    pub districts: Option<Vec<District>>,
    pub complexes: Option<Vec<Complex>>,
    /// Confirmation payload of the last successful set-location call.
    pub location: Option<Value>,
    pub captcha: Option<CaptchaImage>,
    /// Generation of the most recently issued captcha, kept across discards.
    pub captcha_generation: u64,
    pub results: Option<Value>,
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
            ..Self::default()
        }
    }

    pub fn update(mut self, update: SessionUpdate) -> Self {
        if let Some(credential) = update.credential {
            self.credential = Some(credential);
        }
        for (field, value) in [
            (Field::State, update.state_code),
            (Field::District, update.dist_code),
            (Field::Complex, update.complex_code),
            (Field::Establishment, update.est_code),
        ] {
            if let (Some(slot), Some(value)) = (self.selections.slot(field), normalize_code(value.as_deref())) {
                *slot = Some(value);
            }
        }
        if update.districts.is_some() {
            self.districts = update.districts;
        }
        if update.complexes.is_some() {
            self.complexes = update.complexes;
        }
        if update.location.is_some() {
            self.location = update.location;
        }
        if let Some(captcha) = update.captcha {
            self.captcha_generation = self.captcha_generation.max(captcha.generation);
            self.captcha = Some(captcha);
        }
        if update.results.is_some() {
            self.results = update.results;
        }
        self
    }

    /// Clears every selection after `field` and all remote data derived from
    /// `field` or anything after it. Search results are always dropped.
    pub fn reset_downstream_of(mut self, field: Field) -> Self {
        for downstream in field.downstream() {
            if let Some(slot) = self.selections.slot(downstream) {
                *slot = None;
            }
        }
        if field <= Field::State {
            self.districts = None;
        }
        if field <= Field::District {
            self.complexes = None;
        }
        if field <= Field::Establishment {
            self.location = None;
            self.captcha = None;
        }
        self.results = None;
        self
    }

    /// Sets `field` to `code` after resetting everything downstream of it.
    pub fn select(self, field: Field, code: Option<&str>) -> Self {
        let mut next = self.reset_downstream_of(field);
        if let Some(slot) = next.selections.slot(field) {
            *slot = normalize_code(code);
        }
        next
    }

    pub fn discard_captcha(mut self) -> Self {
        self.captcha = None;
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(message.into());
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.last_error = None;
        self
    }

    pub fn require_credential(&self) -> Result<&Credential> {
        self.credential
            .as_ref()
            .ok_or_else(|| Error::Validation("App token is missing. Please restart the process.".to_string()))
    }

    pub fn require(&self, field: Field) -> Result<&str> {
        self.selections
            .get(field)
            .ok_or_else(|| Error::Validation(format!("No {} selected.", field)))
    }

    pub fn next_captcha_generation(&self) -> u64 {
        self.captcha_generation + 1
    }
}
