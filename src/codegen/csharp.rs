//! C# early-bound proxy generation.
//!
//! Entities become partial classes over `Microsoft.Xrm.Sdk.Entity` with one
//! property per generated attribute; actions become request/response class
//! pairs over `OrganizationRequest`/`OrganizationResponse`.

use crate::codegen::utils::{doc_line, escape_string, escape_xml};
use crate::codegen::{
    enum_type_name, is_shared, numeric_bounds, render, Dialect, EmitOptions, Emitter,
    EntityUnits, SourceUnit, OPTION_SET_DIR,
};
use crate::error::Result;
use crate::metadata::types::AttributeTypeCode;
use crate::model::{
    ActionArgument, ActionData, ArgumentType, AttributeData, AttributeKind, CollectionFetcherData,
    EntityData, IntersectFetcherData, OptionSetData, ValueType,
};
use std::io::{self, Write};

const INDENT: &str = "    ";

/// Emitter for the C# dialect
pub struct CSharpEmitter {
    options: EmitOptions,
}

impl CSharpEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    fn property_type(&self, entity: &EntityData, value_type: &ValueType) -> String {
        match value_type {
            ValueType::Boolean => "bool?".to_string(),
            ValueType::DateTime => "DateTime?".to_string(),
            ValueType::Integer => "int?".to_string(),
            ValueType::BigInt => "long?".to_string(),
            ValueType::Decimal => "decimal?".to_string(),
            ValueType::Double => "double?".to_string(),
            ValueType::Money => "Money".to_string(),
            ValueType::String => "string".to_string(),
            ValueType::Guid => "Guid?".to_string(),
            ValueType::EntityReference => "EntityReference".to_string(),
            ValueType::EntityReferenceCollection => "EntityCollection".to_string(),
            ValueType::OptionSet { option_set } => match entity.option_set(option_set) {
                Some(o) => format!("{}?", enum_type_name(entity, o, &self.options)),
                None => "OptionSetValue".to_string(),
            },
        }
    }

    fn write_entity<W: Write>(&self, w: &mut W, entity: &EntityData) -> io::Result<()> {
        write_header(w, &format!("entity '{}'", entity.logical_name))?;
        writeln!(w, "using System;")?;
        writeln!(w, "using System.Collections.Generic;")?;
        writeln!(w, "using System.Linq;")?;
        writeln!(w, "using Microsoft.Xrm.Sdk;")?;
        writeln!(w)?;
        writeln!(w, "namespace {}", self.options.namespace)?;
        writeln!(w, "{{")?;

        for option_set in entity
            .internal_option_sets
            .iter()
            .chain(entity.external_option_sets.iter())
            .filter(|o| !is_shared(o, &self.options))
        {
            self.write_enum(w, entity, option_set)?;
            writeln!(w)?;
        }

        let class = &entity.class_name;
        let summary = entity.description.as_deref().unwrap_or(&entity.display_name);
        writeln!(w, "{INDENT}/// <summary>")?;
        writeln!(w, "{INDENT}/// {}", escape_xml(&doc_line(summary)))?;
        writeln!(w, "{INDENT}/// </summary>")?;
        writeln!(
            w,
            "{INDENT}[Microsoft.Xrm.Sdk.Client.EntityLogicalName(\"{}\")]",
            entity.logical_name
        )?;
        writeln!(w, "{INDENT}public partial class {} : Entity", class)?;
        writeln!(w, "{INDENT}{{")?;
        writeln!(
            w,
            "{INDENT}{INDENT}public const string EntityLogicalName = \"{}\";",
            entity.logical_name
        )?;
        if let Some(set_name) = &entity.entity_set_name {
            writeln!(w, "{INDENT}{INDENT}public const string EntitySetName = \"{}\";", set_name)?;
        }
        writeln!(
            w,
            "{INDENT}{INDENT}public const int EntityTypeCode = {};",
            entity.object_type_code
        )?;
        if let Some(id) = &entity.primary_id_attribute {
            writeln!(w, "{INDENT}{INDENT}public const string PrimaryIdAttribute = \"{}\";", id)?;
        }
        if let Some(name) = &entity.primary_name_attribute {
            writeln!(w, "{INDENT}{INDENT}public const string PrimaryNameAttribute = \"{}\";", name)?;
        }
        writeln!(w)?;
        writeln!(w, "{INDENT}{INDENT}public {}() : base(EntityLogicalName)", class)?;
        writeln!(w, "{INDENT}{INDENT}{{")?;
        writeln!(w, "{INDENT}{INDENT}}}")?;
        writeln!(w)?;
        writeln!(w, "{INDENT}{INDENT}public {}(Guid id) : base(EntityLogicalName, id)", class)?;
        writeln!(w, "{INDENT}{INDENT}{{")?;
        writeln!(w, "{INDENT}{INDENT}}}")?;

        for attribute in entity.generated_attributes() {
            writeln!(w)?;
            self.write_attribute(w, entity, attribute)?;
        }

        for fetcher in &entity.collection_fetchers {
            writeln!(w)?;
            write_collection(w, entity, fetcher)?;
        }

        for fetcher in &entity.intersect_fetchers {
            writeln!(w)?;
            write_intersect(w, entity, fetcher)?;
        }

        writeln!(w, "{INDENT}}}")?;
        writeln!(w, "}}")?;
        Ok(())
    }

    fn write_attribute<W: Write>(
        &self,
        w: &mut W,
        entity: &EntityData,
        attribute: &AttributeData,
    ) -> io::Result<()> {
        let pad = format!("{INDENT}{INDENT}");
        let logical = &attribute.logical_name;
        let name = &attribute.getter.name;
        let property_type = self.property_type(entity, &attribute.getter.value_type);

        writeln!(w, "{pad}/// <summary>")?;
        writeln!(w, "{pad}/// {}", escape_xml(&doc_line(&attribute.summary)))?;
        writeln!(w, "{pad}/// </summary>")?;
        if let AttributeKind::DateTime { behavior } = &attribute.kind {
            writeln!(w, "{pad}/// <remarks>Behavior: {:?}</remarks>", behavior)?;
        }
        writeln!(w, "{pad}[AttributeLogicalName(\"{}\")]", logical)?;
        writeln!(w, "{pad}public {} {}", property_type, name)?;
        writeln!(w, "{pad}{{")?;

        match &attribute.kind {
            AttributeKind::MoneyValue { .. } => {
                writeln!(
                    w,
                    "{pad}{INDENT}get {{ return GetAttributeValue<Money>(\"{}\")?.Value; }}",
                    logical
                )?;
            }
            AttributeKind::OptionSet { .. } => {
                let enum_type = property_type.trim_end_matches('?');
                writeln!(w, "{pad}{INDENT}get")?;
                writeln!(w, "{pad}{INDENT}{{")?;
                writeln!(
                    w,
                    "{pad}{INDENT}{INDENT}var option = GetAttributeValue<OptionSetValue>(\"{}\");",
                    logical
                )?;
                writeln!(
                    w,
                    "{pad}{INDENT}{INDENT}return option == null ? ({0}?)null : ({0})option.Value;",
                    enum_type
                )?;
                writeln!(w, "{pad}{INDENT}}}")?;
            }
            _ => {
                writeln!(
                    w,
                    "{pad}{INDENT}get {{ return GetAttributeValue<{}>(\"{}\"); }}",
                    property_type, logical
                )?;
            }
        }

        if attribute.setter.generate {
            self.write_setter(w, entity, attribute, &pad)?;
        }
        writeln!(w, "{pad}}}")?;

        if attribute.formatted_getter.generate {
            writeln!(w)?;
            writeln!(
                w,
                "{pad}public string {} => FormattedValues.Contains(\"{1}\") ? FormattedValues[\"{1}\"] : null;",
                attribute.formatted_getter.name, logical
            )?;
        }
        Ok(())
    }

    fn write_setter<W: Write>(
        &self,
        w: &mut W,
        entity: &EntityData,
        attribute: &AttributeData,
        pad: &str,
    ) -> io::Result<()> {
        let logical = &attribute.logical_name;
        let name = &attribute.setter.name;
        let body = format!("{pad}{INDENT}{INDENT}");

        writeln!(w, "{pad}{INDENT}set")?;
        writeln!(w, "{pad}{INDENT}{{")?;

        if let Some((min, max)) = numeric_bounds(attribute) {
            let suffix = match attribute.kind {
                AttributeKind::MoneyValue { .. } => "m",
                AttributeKind::Precision { .. }
                    if attribute.type_code == AttributeTypeCode::Decimal =>
                {
                    "m"
                }
                _ => "",
            };
            writeln!(
                w,
                "{body}if (value.HasValue && (value.Value < {min}{suffix} || value.Value > {max}{suffix}))"
            )?;
            writeln!(w, "{body}{{")?;
            writeln!(
                w,
                "{body}{INDENT}throw new ArgumentOutOfRangeException(nameof({name}), value, \"{name} must be between {min} and {max}.\");"
            )?;
            writeln!(w, "{body}}}")?;
        }

        if let AttributeKind::String {
            max_length: Some(max_length),
        } = attribute.kind
        {
            writeln!(w, "{body}if (value != null && value.Length > {max_length})")?;
            writeln!(w, "{body}{{")?;
            writeln!(
                w,
                "{body}{INDENT}throw new ArgumentOutOfRangeException(nameof({name}), \"{name} is limited to {max_length} characters.\");"
            )?;
            writeln!(w, "{body}}}")?;
        }

        if let AttributeKind::Lookup { relations } = &attribute.kind {
            let targets: Vec<String> = relations
                .iter()
                .map(|r| format!("\"{}\"", r.referenced_entity))
                .collect();
            writeln!(
                w,
                "{body}if (value != null && !new[] {{ {} }}.Contains(value.LogicalName))",
                targets.join(", ")
            )?;
            writeln!(w, "{body}{{")?;
            writeln!(
                w,
                "{body}{INDENT}throw new ArgumentException(\"{name} cannot reference \" + value.LogicalName + \".\", nameof({name}));"
            )?;
            writeln!(w, "{body}}}")?;
        }

        match &attribute.kind {
            AttributeKind::MoneyValue { .. } => writeln!(
                w,
                "{body}SetAttributeValue(\"{logical}\", value.HasValue ? new Money(value.Value) : null);"
            )?,
            AttributeKind::OptionSet { .. } => writeln!(
                w,
                "{body}SetAttributeValue(\"{logical}\", value.HasValue ? new OptionSetValue((int)value.Value) : null);"
            )?,
            AttributeKind::Identifier
                if entity.primary_id_attribute.as_deref() == Some(logical.as_str()) =>
            {
                writeln!(w, "{body}SetAttributeValue(\"{logical}\", value);")?;
                writeln!(w, "{body}base.Id = value ?? Guid.Empty;")?;
            }
            _ => writeln!(w, "{body}SetAttributeValue(\"{logical}\", value);")?,
        }

        writeln!(w, "{pad}{INDENT}}}")?;
        Ok(())
    }

    fn write_enum<W: Write>(
        &self,
        w: &mut W,
        entity: &EntityData,
        option_set: &OptionSetData,
    ) -> io::Result<()> {
        writeln!(w, "{INDENT}/// <summary>")?;
        writeln!(w, "{INDENT}/// {}", escape_xml(&doc_line(&option_set.display_name)))?;
        writeln!(w, "{INDENT}/// </summary>")?;
        if let Some(linked) = option_set
            .linked_option_set
            .as_deref()
            .and_then(|l| entity.option_set(l))
        {
            writeln!(
                w,
                "{INDENT}/// <remarks>Linked to {}</remarks>",
                enum_type_name(entity, linked, &self.options)
            )?;
        }
        writeln!(
            w,
            "{INDENT}public enum {}",
            enum_type_name(entity, option_set, &self.options)
        )?;
        writeln!(w, "{INDENT}{{")?;
        for option in &option_set.options {
            match option.state {
                Some(state) => writeln!(
                    w,
                    "{INDENT}{INDENT}{} = {}, // state {}",
                    option.name, option.value, state
                )?,
                None => writeln!(w, "{INDENT}{INDENT}{} = {},", option.name, option.value)?,
            }
        }
        writeln!(w, "{INDENT}}}")?;
        Ok(())
    }

    fn write_shared_enum<W: Write>(
        &self,
        w: &mut W,
        entity: &EntityData,
        option_set: &OptionSetData,
    ) -> io::Result<()> {
        write_header(w, &format!("option set '{}'", option_set.logical_name))?;
        writeln!(w, "namespace {}", self.options.namespace)?;
        writeln!(w, "{{")?;
        self.write_enum(w, entity, option_set)?;
        writeln!(w, "}}")?;
        Ok(())
    }

    fn write_action<W: Write>(&self, w: &mut W, action: &ActionData) -> io::Result<()> {
        let request = format!("{}Request", action.class_name);
        let response = format!("{}Response", action.class_name);

        write_header(w, &format!("action '{}'", action.unique_name))?;
        writeln!(w, "using System;")?;
        writeln!(w, "using Microsoft.Xrm.Sdk;")?;
        writeln!(w)?;
        writeln!(w, "namespace {}", self.options.namespace)?;
        writeln!(w, "{{")?;

        writeln!(w, "{INDENT}/// <summary>")?;
        writeln!(w, "{INDENT}/// {}", escape_xml(&doc_line(&action.display_name)))?;
        writeln!(w, "{INDENT}/// </summary>")?;
        writeln!(w, "{INDENT}[RequestProxy(\"{}\")]", action.unique_name)?;
        writeln!(w, "{INDENT}public partial class {} : OrganizationRequest", request)?;
        writeln!(w, "{INDENT}{{")?;
        writeln!(
            w,
            "{INDENT}{INDENT}public const string ActionName = \"{}\";",
            action.unique_name
        )?;
        writeln!(w)?;
        writeln!(w, "{INDENT}{INDENT}public {}()", request)?;
        writeln!(w, "{INDENT}{INDENT}{{")?;
        writeln!(w, "{INDENT}{INDENT}{INDENT}RequestName = ActionName;")?;
        writeln!(w, "{INDENT}{INDENT}}}")?;

        if action.is_target_bound() {
            let target = action
                .inputs
                .iter()
                .find(|a| a.is_target)
                .map(|a| a.name.as_str())
                .unwrap_or("Target");
            writeln!(w)?;
            writeln!(
                w,
                "{INDENT}{INDENT}public {}(EntityReference target) : this()",
                request
            )?;
            writeln!(w, "{INDENT}{INDENT}{{")?;
            writeln!(
                w,
                "{INDENT}{INDENT}{INDENT}Parameters[\"{}\"] = target;",
                escape_string(target)
            )?;
            writeln!(w, "{INDENT}{INDENT}}}")?;
        }

        for argument in &action.inputs {
            writeln!(w)?;
            write_argument(w, argument, "Parameters", !argument.is_target)?;
        }
        writeln!(w, "{INDENT}}}")?;
        writeln!(w)?;

        writeln!(w, "{INDENT}[ResponseProxy(\"{}\")]", action.unique_name)?;
        writeln!(w, "{INDENT}public partial class {} : OrganizationResponse", response)?;
        writeln!(w, "{INDENT}{{")?;
        for (i, argument) in action.outputs.iter().enumerate() {
            if i > 0 {
                writeln!(w)?;
            }
            write_argument(w, argument, "Results", false)?;
        }
        writeln!(w, "{INDENT}}}")?;
        writeln!(w, "}}")?;
        Ok(())
    }
}

impl Emitter for CSharpEmitter {
    fn dialect(&self) -> Dialect {
        Dialect::CSharp
    }

    fn emit_entity(&self, entity: &EntityData) -> Result<EntityUnits> {
        let contents = render(|w| self.write_entity(w, entity))?;

        let mut option_sets = Vec::new();
        for option_set in entity
            .external_option_sets
            .iter()
            .filter(|o| is_shared(o, &self.options))
        {
            let contents = render(|w| self.write_shared_enum(w, entity, option_set))?;
            let path = format!("{}/{}.cs", OPTION_SET_DIR, option_set.exposed_name);
            option_sets.push(SourceUnit::new(path, contents));
        }

        Ok(EntityUnits {
            entity: SourceUnit::new(format!("{}.cs", entity.class_name), contents),
            option_sets,
        })
    }

    fn emit_action(&self, action: &ActionData) -> Result<SourceUnit> {
        let contents = render(|w| self.write_action(w, action))?;
        Ok(SourceUnit::new(format!("{}.cs", action.class_name), contents))
    }
}

fn write_header<W: Write>(w: &mut W, source: &str) -> io::Result<()> {
    writeln!(w, "//------------------------------------------------------------------------------")?;
    writeln!(w, "// <auto-generated>")?;
    writeln!(w, "//     Generated by crmgen from {}.", source)?;
    writeln!(w, "//     Changes to this file will be lost when the code is regenerated.")?;
    writeln!(w, "// </auto-generated>")?;
    writeln!(w, "//------------------------------------------------------------------------------")?;
    writeln!(w)?;
    Ok(())
}

fn write_collection<W: Write>(
    w: &mut W,
    entity: &EntityData,
    fetcher: &CollectionFetcherData,
) -> io::Result<()> {
    let pad = format!("{INDENT}{INDENT}");
    let role = if fetcher.related_entity == entity.logical_name {
        "EntityRole.Referenced"
    } else {
        "null"
    };
    writeln!(w, "{pad}/// <summary>")?;
    writeln!(
        w,
        "{pad}/// 1:N {} ({}.{})",
        fetcher.relationship_schema_name, fetcher.related_entity, fetcher.related_attribute
    )?;
    writeln!(w, "{pad}/// </summary>")?;
    writeln!(w, "{pad}[RelationshipSchemaName(\"{}\")]", fetcher.relationship_schema_name)?;
    writeln!(
        w,
        "{pad}public IEnumerable<{}> {}",
        fetcher.target_class_name, fetcher.accessor_name
    )?;
    writeln!(w, "{pad}{{")?;
    writeln!(
        w,
        "{pad}{INDENT}get {{ return GetRelatedEntities<{}>(\"{}\", {}); }}",
        fetcher.target_class_name, fetcher.relationship_schema_name, role
    )?;
    writeln!(w, "{pad}}}")?;
    Ok(())
}

fn write_intersect<W: Write>(
    w: &mut W,
    entity: &EntityData,
    fetcher: &IntersectFetcherData,
) -> io::Result<()> {
    let pad = format!("{INDENT}{INDENT}");
    let role = if fetcher.target_entity == entity.logical_name {
        "EntityRole.Referencing"
    } else {
        "null"
    };
    writeln!(w, "{pad}/// <summary>")?;
    writeln!(
        w,
        "{pad}/// N:N {} (via {})",
        fetcher.relationship_schema_name, fetcher.intersect_entity
    )?;
    writeln!(w, "{pad}/// </summary>")?;
    writeln!(w, "{pad}[RelationshipSchemaName(\"{}\")]", fetcher.relationship_schema_name)?;
    writeln!(
        w,
        "{pad}public IEnumerable<{}> {}",
        fetcher.target_class_name, fetcher.accessor_name
    )?;
    writeln!(w, "{pad}{{")?;
    writeln!(
        w,
        "{pad}{INDENT}get {{ return GetRelatedEntities<{}>(\"{}\", {}); }}",
        fetcher.target_class_name, fetcher.relationship_schema_name, role
    )?;
    writeln!(w, "{pad}}}")?;
    Ok(())
}

fn argument_type(argument_type: ArgumentType) -> &'static str {
    match argument_type {
        ArgumentType::Boolean => "bool",
        ArgumentType::DateTime => "DateTime",
        ArgumentType::Decimal => "decimal",
        ArgumentType::Double => "double",
        ArgumentType::Integer => "int",
        ArgumentType::Money => "Money",
        ArgumentType::String => "string",
        ArgumentType::Guid => "Guid",
        ArgumentType::OptionSetValue => "OptionSetValue",
        ArgumentType::EntityReference => "EntityReference",
        ArgumentType::Entity => "Entity",
        ArgumentType::EntityCollection => "EntityCollection",
    }
}

fn write_argument<W: Write>(
    w: &mut W,
    argument: &ActionArgument,
    collection: &str,
    settable: bool,
) -> io::Result<()> {
    let pad = format!("{INDENT}{INDENT}");
    let cs_type = argument_type(argument.argument_type);
    let key = escape_string(&argument.name);

    let mut notes = Vec::new();
    if let Some(description) = &argument.description {
        notes.push(doc_line(description));
    }
    if argument.required {
        notes.push("Required.".to_string());
    }
    if let Some(entity) = &argument.related_entity {
        notes.push(format!("Entity: {}.", entity));
    }
    if !notes.is_empty() {
        writeln!(w, "{pad}/// <summary>")?;
        writeln!(w, "{pad}/// {}", escape_xml(&notes.join(" ")))?;
        writeln!(w, "{pad}/// </summary>")?;
    }

    writeln!(w, "{pad}public {} {}", cs_type, argument.name)?;
    writeln!(w, "{pad}{{")?;
    writeln!(
        w,
        "{pad}{INDENT}get {{ return {collection}.Contains(\"{key}\") ? ({cs_type}){collection}[\"{key}\"] : default({cs_type}); }}"
    )?;
    if settable {
        writeln!(w, "{pad}{INDENT}set {{ {collection}[\"{key}\"] = value; }}")?;
    }
    writeln!(w, "{pad}}}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GenerationOutput;
    use crate::metadata::cache::MetadataCache;
    use crate::metadata::service::MetadataService;
    use crate::metadata::snapshot::fixture_service;
    use crate::model::{build_action, deduplicate};
    use std::num::NonZeroUsize;

    fn entity(key: &str) -> EntityData {
        let service = fixture_service();
        let cache = MetadataCache::new(NonZeroUsize::new(200).unwrap());
        let entity = cache
            .get_entities(&service, &[key.to_string()])
            .unwrap()
            .remove(0);
        deduplicate(entity)
    }

    fn action(name: &str) -> ActionData {
        let record = fixture_service()
            .fetch_action_definitions(&[name.to_string()])
            .unwrap()
            .remove(0);
        build_action(&record).unwrap()
    }

    fn emitter() -> CSharpEmitter {
        CSharpEmitter::new(EmitOptions::default())
    }

    #[test]
    fn test_entity_class_shape() {
        let units = emitter().emit_entity(&entity("account")).unwrap();
        let code = &units.entity.contents;

        assert_eq!(units.entity.path.to_str(), Some("Account.cs"));
        assert!(code.contains("namespace Xrm.Proxies"));
        assert!(code.contains("public partial class Account : Entity"));
        assert!(code.contains("public const string EntityLogicalName = \"account\";"));
        assert!(code.contains("[AttributeLogicalName(\"name\")]"));
        assert!(code.contains("public string AccountName"));
    }

    #[test]
    fn test_money_value_setter_checks_range() {
        let code = emitter().emit_entity(&entity("account")).unwrap().entity.contents;

        assert!(code.contains("public Money CreditLimit"));
        assert!(code.contains("public decimal? CreditLimitValue"));
        assert!(code.contains("value.Value < 0m || value.Value > 1000000m"));
        assert!(code.contains("new Money(value.Value)"));
    }

    #[test]
    fn test_read_only_attribute_has_no_setter() {
        let code = emitter().emit_entity(&entity("account")).unwrap().entity.contents;
        let start = code.find("public decimal? ExchangeRate").unwrap();
        let block = &code[start..start + code[start..].find("\n        }").unwrap()];
        assert!(block.contains("get"));
        assert!(!block.contains("set"));
    }

    #[test]
    fn test_collision_renamed_property() {
        let code = emitter().emit_entity(&entity("account")).unwrap().entity.contents;
        assert!(code.contains("public Account_Status? Status\n"));
        assert!(code.contains("public EntityReference Status2\n"));
        assert!(code.contains("public string Status2_Formatted"));
    }

    #[test]
    fn test_shared_option_set_unit() {
        let units = emitter().emit_entity(&entity("account")).unwrap();
        assert_eq!(units.option_sets.len(), 1);
        assert_eq!(units.option_sets[0].path.to_str(), Some("OptionSets/Category.cs"));
        assert!(units.option_sets[0].contents.contains("public enum Category"));
        assert!(units.entity.contents.contains("public Category? Category"));
        assert!(units.entity.contents.contains("public enum Account_Industry"));
    }

    #[test]
    fn test_inline_option_sets_without_consolidation() {
        let emitter = CSharpEmitter::new(EmitOptions {
            consolidate_option_sets: false,
            ..EmitOptions::default()
        });
        let units = emitter.emit_entity(&entity("account")).unwrap();
        assert!(units.option_sets.is_empty());
        assert!(units.entity.contents.contains("public enum Account_Category"));
    }

    #[test]
    fn test_shared_units_deduplicated_across_entities() {
        let emitter = emitter();
        let mut output = GenerationOutput::new();
        output
            .add_entity(emitter.emit_entity(&entity("account")).unwrap())
            .unwrap();
        output
            .add_entity(emitter.emit_entity(&entity("account")).unwrap())
            .unwrap();
        assert_eq!(
            output
                .units()
                .filter(|u| u.path.starts_with(OPTION_SET_DIR))
                .count(),
            1
        );
    }

    #[test]
    fn test_lookup_setter_validates_targets() {
        let code = emitter().emit_entity(&entity("account")).unwrap().entity.contents;
        assert!(code.contains("!new[] { \"systemuser\", \"team\" }.Contains(value.LogicalName)"));
    }

    #[test]
    fn test_fetchers() {
        let code = emitter().emit_entity(&entity("account")).unwrap().entity.contents;
        assert!(code.contains("public IEnumerable<Contact> CompanyName_Contacts"));
        assert!(code.contains("GetRelatedEntities<Account>(\"account_parent_account\", EntityRole.Referenced)"));
        assert!(code.contains("public IEnumerable<Lead> Associated_Leads"));
    }

    #[test]
    fn test_bound_action() {
        let unit = emitter().emit_action(&action("new_ApproveAccount")).unwrap();
        let code = &unit.contents;

        assert_eq!(unit.path.to_str(), Some("ApproveAccount.cs"));
        assert!(code.contains("public partial class ApproveAccountRequest : OrganizationRequest"));
        assert!(code.contains("public ApproveAccountRequest(EntityReference target) : this()"));
        assert!(code.contains("public int Level"));
        assert!(code.contains("public partial class ApproveAccountResponse : OrganizationResponse"));
        assert!(code.contains("public bool Approved"));
        assert!(code.contains("Entity: task."));
    }

    #[test]
    fn test_unbound_action_has_no_target_constructor() {
        let code = emitter().emit_action(&action("new_Ping")).unwrap().contents;
        assert!(!code.contains("EntityReference target"));
        assert!(code.contains("set { Parameters[\"Message\"] = value; }"));
    }
}
