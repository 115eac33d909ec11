//! Action model construction from workflow XAML.
//!
//! Custom action arguments are declared as `x:Property` children of an
//! `x:Members` element. The argument type and direction come from the
//! `InArgument(...)`/`OutArgument(...)` wrapper in the `Type` attribute; the
//! remaining details are `Argument*Attribute` elements carrying a `Value`.

use crate::metadata::types::ActionRecord;
use crate::model::naming;
use crate::model::types::{ActionArgument, ActionData, ArgumentDirection, ArgumentType};
use regex::Regex;
use roxmltree::{Document, Node};
use std::sync::LazyLock;
use thiserror::Error;

/// `InArgument(x:String)` -> direction and type name
static ARGUMENT_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(In|Out)Argument\((?:\w+:)?(\w+)\)$").expect("argument type pattern is valid")
});

/// Failure to read an action's argument list
#[derive(Debug, Error)]
pub enum ActionParseError {
    #[error("Invalid action XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Action XML has no Members element")]
    MissingMembers,

    #[error("Argument is missing its '{0}' attribute")]
    MissingAttribute(&'static str),

    #[error("Argument '{name}' has unsupported type '{declared}'")]
    UnsupportedType { name: String, declared: String },
}

/// Build the action model, or `None` when its argument list cannot be read
///
/// Failures are logged and never propagated, so one broken action does not
/// abort generation of the others.
pub fn build_action(record: &ActionRecord) -> Option<ActionData> {
    let arguments = match parse_arguments(&record.xaml) {
        Ok(arguments) => arguments,
        Err(e) => {
            tracing::warn!("Skipping action '{}': {}", record.unique_name, e);
            return None;
        }
    };

    let (inputs, outputs): (Vec<_>, Vec<_>) = arguments
        .into_iter()
        .partition(|a| a.direction == ArgumentDirection::Input);

    let primary_entity = record
        .primary_entity
        .as_deref()
        .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("none"))
        .map(str::to_string);

    Some(ActionData {
        unique_name: record.unique_name.clone(),
        display_name: record
            .display_name
            .clone()
            .unwrap_or_else(|| record.unique_name.clone()),
        class_name: naming::code_name_or(record.display_name.as_deref(), &record.unique_name),
        primary_entity,
        inputs,
        outputs,
    })
}

/// Parse the ordered argument list out of an action's XAML
pub fn parse_arguments(xaml: &str) -> Result<Vec<ActionArgument>, ActionParseError> {
    let document = Document::parse(xaml)?;
    let members = document
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "Members")
        .ok_or(ActionParseError::MissingMembers)?;

    members
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "Property")
        .map(parse_argument)
        .collect()
}

fn parse_argument(property: Node) -> Result<ActionArgument, ActionParseError> {
    let name = property
        .attribute("Name")
        .ok_or(ActionParseError::MissingAttribute("Name"))?;
    let declared = property
        .attribute("Type")
        .ok_or(ActionParseError::MissingAttribute("Type"))?;

    let unsupported = || ActionParseError::UnsupportedType {
        name: name.to_string(),
        declared: declared.to_string(),
    };
    let captures = ARGUMENT_TYPE.captures(declared).ok_or_else(unsupported)?;
    let direction = match &captures[1] {
        "In" => ArgumentDirection::Input,
        _ => ArgumentDirection::Output,
    };
    let argument_type = ArgumentType::from_declared(&captures[2]).ok_or_else(unsupported)?;

    let related_entity = if argument_type.is_entity() {
        setting(property, "ArgumentEntityAttribute")
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    } else {
        None
    };

    Ok(ActionArgument {
        name: name.to_string(),
        argument_type,
        direction,
        required: flag(property, "ArgumentRequiredAttribute"),
        is_target: flag(property, "ArgumentTargetAttribute"),
        related_entity,
        description: setting(property, "ArgumentDescriptionAttribute")
            .filter(|v| !v.is_empty())
            .map(str::to_string),
    })
}

/// `Value` of the `Argument*Attribute` element named `local` under `property`
fn setting<'a>(property: Node<'a, '_>, local: &str) -> Option<&'a str> {
    property
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == local)
        .and_then(|n| n.attribute("Value"))
}

fn flag(property: Node, local: &str) -> bool {
    setting(property, local)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
