//! Splits request parameters into query, form, and body channels.

use crate::gateway::params::{ChannelMap, ParamSource, ParamValue};

/// Per-channel parameter mappings. `None` means the route does not use the channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channels {
    pub query: Option<ChannelMap>,
    pub form: Option<ChannelMap>,
    pub body: Option<ChannelMap>,
}

/// Select the parameters each channel declares.
pub fn split<S: ParamSource + ?Sized>(
    params: &S,
    query_names: &[String],
    form_names: &[String],
    body_names: &[String],
) -> Channels {
    Channels {
        query: unzip(params, query_names),
        form: unzip(params, form_names),
        body: unzip(params, body_names),
    }
}

/// Look up `names` in `params`.
///
/// Missing names are skipped. Object values are flattened into the result;
/// anything else stays under its own name.
pub fn unzip<S: ParamSource + ?Sized>(params: &S, names: &[String]) -> Option<ChannelMap> {
    if names.is_empty() {
        return None;
    }

    let mut channel = ChannelMap::new();
    for name in names {
        match params.get(name) {
            None => continue,
            Some(ParamValue::Map(fields)) => {
                for (field, value) in fields {
                    channel.insert(field.clone(), ParamValue::from_json(value.clone()));
                }
            }
            Some(value) => channel.insert(name.clone(), value.clone()),
        }
    }
    Some(channel)
}
