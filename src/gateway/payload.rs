//! Outbound payload encoding.
//!
//! # Responsibilities
//! - Turn the body channel into a JSON object payload
//! - Turn the form channel plus any pre-parsed inbound form into form fields
//! - Pick the single payload that occupies the outbound body
//!
//! # Design Decisions
//! - Form wins over JSON: a request body carries exactly one encoding
//! - Files cannot be JSON-encoded; non-string values cannot be form fields
//! - Wire format is decided by the client: any file field means multipart

use serde_json::{Map, Value};
use thiserror::Error;

use crate::gateway::params::{ChannelMap, FilePart, ParamValue};

/// A value that cannot be placed in the requested wire encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field '{field}' cannot be encoded as {target}")]
pub struct EncodingError {
    pub field: String,
    pub target: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File(FilePart),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

/// The single body sent downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OutboundPayload {
    #[default]
    Empty,
    Form(Vec<FormField>),
    Json(Map<String, Value>),
}

impl OutboundPayload {
    pub fn is_empty(&self) -> bool {
        matches!(self, OutboundPayload::Empty)
    }

    /// True for a form payload carrying at least one file.
    pub fn is_multipart(&self) -> bool {
        match self {
            OutboundPayload::Form(fields) => fields
                .iter()
                .any(|f| matches!(f.value, FormValue::File(_))),
            _ => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutboundPayload::Empty => "empty",
            OutboundPayload::Form(_) if self.is_multipart() => "multipart",
            OutboundPayload::Form(_) => "form",
            OutboundPayload::Json(_) => "json",
        }
    }
}

/// Encode the body channel as a JSON object.
pub fn encode_body(body: Option<&ChannelMap>) -> Result<OutboundPayload, EncodingError> {
    let body = match body {
        Some(body) if !body.is_empty() => body,
        _ => return Ok(OutboundPayload::Empty),
    };

    let mut object = Map::new();
    for (name, value) in body.iter() {
        let json = value.to_json().ok_or_else(|| EncodingError {
            field: name.to_string(),
            target: "json",
        })?;
        object.insert(name.to_string(), json);
    }
    Ok(OutboundPayload::Json(object))
}

/// Encode form fields from the declared form channel, then from the pre-parsed
/// inbound form for any field the declared channel did not cover.
pub fn encode_form(
    declared: Option<&ChannelMap>,
    parsed_form: Option<&ChannelMap>,
) -> Result<OutboundPayload, EncodingError> {
    let mut fields = Vec::new();

    if let Some(declared) = declared {
        for (name, value) in declared.iter() {
            fields.push(form_field(name, value)?);
        }
    }

    if let Some(parsed) = parsed_form {
        for (name, value) in parsed.iter() {
            let covered = declared.is_some_and(|d| d.contains_key(name));
            if !covered {
                fields.push(form_field(name, value)?);
            }
        }
    }

    if fields.is_empty() {
        Ok(OutboundPayload::Empty)
    } else {
        Ok(OutboundPayload::Form(fields))
    }
}

fn form_field(name: &str, value: &ParamValue) -> Result<FormField, EncodingError> {
    let value = match value {
        ParamValue::Text(s) => FormValue::Text(s.clone()),
        ParamValue::Scalar(Value::String(s)) => FormValue::Text(s.clone()),
        ParamValue::File(file) => FormValue::File(file.clone()),
        ParamValue::Scalar(_) | ParamValue::Map(_) => {
            return Err(EncodingError {
                field: name.to_string(),
                target: "form field",
            })
        }
    };
    Ok(FormField {
        name: name.to_string(),
        value,
    })
}

/// Choose the outbound payload: a non-empty form beats the JSON body.
pub fn merge(form: OutboundPayload, body: OutboundPayload) -> OutboundPayload {
    if form.is_empty() {
        body
    } else {
        form
    }
}
