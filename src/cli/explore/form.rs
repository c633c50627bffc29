use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{error, info};

use super::city::{CityRecord, SchemaError, parse_city_records};
use super::conversation_state::PromptSession;
use super::location::Address;
use crate::gemini_client::GenerativeBackend;

/// The two form inputs, in the order they are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    StateName,
    CountryName,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::StateName, Field::CountryName];

    pub fn label(&self) -> &'static str {
        match self {
            Field::StateName => "State name",
            Field::CountryName => "Country name",
        }
    }

    fn required_message(&self) -> &'static str {
        match self {
            Field::StateName => "State name is required",
            Field::CountryName => "Country name is required",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationQuery {
    pub state_name: String,
    pub country_name: String,
}

impl LocationQuery {
    #[cfg(test)]
    pub fn new(state_name: impl Into<String>, country_name: impl Into<String>) -> Self {
        Self {
            state_name: state_name.into(),
            country_name: country_name.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::StateName => &self.state_name,
            Field::CountryName => &self.country_name,
        }
    }

    fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::StateName => &mut self.state_name,
            Field::CountryName => &mut self.country_name,
        }
    }
}

/// Field messages ordered by field position.
pub type FieldErrors = BTreeMap<Field, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub field_errors: FieldErrors,
}

impl Validation {
    pub fn first_invalid(&self) -> Option<Field> {
        self.field_errors.keys().next().copied()
    }
}

pub fn validate(query: &LocationQuery) -> Validation {
    let field_errors: FieldErrors = Field::ALL
        .iter()
        .filter(|field| query.get(**field).trim().is_empty())
        .map(|field| (*field, field.required_message().to_string()))
        .collect();

    Validation {
        valid: field_errors.is_empty(),
        field_errors,
    }
}

/// The instruction sent to the model for one state/country pair.
pub fn build_prompt(state_name: &str, country_name: &str) -> String {
    format!(
        "give me list of cities in given state:{},country:{}.include cities,short description,history,famous for. in json format",
        state_name.trim(),
        country_name.trim()
    )
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{}", join_messages(.0))]
    Validation(FieldErrors),

    #[error("could not fetch cities: {0}")]
    Backend(eyre::Report),

    #[error("could not read the city list: {0}")]
    Response(#[from] SchemaError),
}

fn join_messages(errors: &FieldErrors) -> String {
    errors.values().cloned().collect::<Vec<_>>().join(", ")
}

/// Owns the form state and drives one submission at a time.
pub struct FormController<B> {
    query: LocationQuery,
    errors: FieldErrors,
    focus: Field,
    loading: bool,
    session: PromptSession<B>,
}

impl<B: GenerativeBackend> FormController<B> {
    pub fn new(session: PromptSession<B>) -> Self {
        Self {
            query: LocationQuery::default(),
            errors: FieldErrors::new(),
            focus: Field::StateName,
            loading: false,
            session,
        }
    }

    pub fn query(&self) -> &LocationQuery {
        &self.query
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error_for(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// The field that should receive input next.
    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn set_focus(&mut self, field: Field) {
        self.focus = field;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn session(&self) -> &PromptSession<B> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PromptSession<B> {
        &mut self.session
    }

    /// Update one field. Editing a field clears its error.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        *self.query.get_mut(field) = value.into();
        self.errors.remove(&field);
    }

    /// Clear both fields and every error message.
    pub fn reset(&mut self) {
        self.query = LocationQuery::default();
        self.errors.clear();
        self.focus = Field::StateName;
    }

    /// Pre-fill both fields from a detected address.
    pub fn apply_address(&mut self, address: &Address) {
        self.set_field(Field::StateName, address.state.clone());
        self.set_field(Field::CountryName, address.country.clone());
    }

    /// Validate, ask the model for cities and parse its reply.
    ///
    /// Invalid input never reaches the backend. The loading flag is cleared
    /// on every path out of this function.
    pub async fn submit(&mut self) -> Result<Vec<CityRecord>, SubmitError> {
        let validation = validate(&self.query);
        self.errors = validation.field_errors.clone();
        if let Some(field) = validation.first_invalid() {
            self.focus = field;
            return Err(SubmitError::Validation(validation.field_errors));
        }

        self.loading = true;
        let result = self.fetch_cities().await;
        self.loading = false;

        match &result {
            Ok(records) => info!(
                state = %self.query.state_name.trim(),
                count = records.len(),
                "Received city list"
            ),
            Err(e) => error!("Submission failed: {}", e),
        }

        result
    }

    async fn fetch_cities(&mut self) -> Result<Vec<CityRecord>, SubmitError> {
        let prompt = build_prompt(&self.query.state_name, &self.query.country_name);
        let response = self
            .session
            .submit(&prompt)
            .await
            .map_err(SubmitError::Backend)?;
        Ok(parse_city_records(&response)?)
    }
}
