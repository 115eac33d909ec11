//! TypeScript proxy generation.
//!
//! Entities become classes over the runtime's `EntityProxy` with get/set
//! accessor pairs; actions become request/response interfaces plus an
//! `ActionProxy` subclass. Files are named after the class in kebab case.

use crate::codegen::utils::{doc_line, escape_string, to_kebab_case};
use crate::codegen::{
    enum_type_name, is_shared, numeric_bounds, render, Dialect, EmitOptions, Emitter,
    EntityUnits, SourceUnit, OPTION_SET_DIR,
};
use crate::error::Result;
use crate::model::{
    ActionArgument, ActionData, ArgumentType, AttributeData, AttributeKind, EntityData,
    OptionSetData, ValueType,
};
use std::io::{self, Write};

/// Module the generated code imports its base classes from
pub const RUNTIME_MODULE: &str = "@crmgen/runtime";

const INDENT: &str = "  ";

/// Emitter for the TypeScript dialect
pub struct TypeScriptEmitter {
    options: EmitOptions,
}

impl TypeScriptEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    fn value_type(&self, entity: &EntityData, value_type: &ValueType) -> String {
        match value_type {
            ValueType::Boolean => "boolean".to_string(),
            ValueType::DateTime => "Date".to_string(),
            ValueType::Integer
            | ValueType::BigInt
            | ValueType::Decimal
            | ValueType::Double => "number".to_string(),
            ValueType::Money => "Money".to_string(),
            ValueType::String | ValueType::Guid => "string".to_string(),
            ValueType::EntityReference => "EntityReference".to_string(),
            ValueType::EntityReferenceCollection => "EntityReference[]".to_string(),
            ValueType::OptionSet { option_set } => match entity.option_set(option_set) {
                Some(o) => enum_type_name(entity, o, &self.options),
                None => "number".to_string(),
            },
        }
    }

    fn shared_option_sets<'a>(
        &'a self,
        entity: &'a EntityData,
    ) -> impl Iterator<Item = &'a OptionSetData> + 'a {
        entity
            .external_option_sets
            .iter()
            .filter(move |o| is_shared(o, &self.options))
    }

    fn write_entity<W: Write>(&self, w: &mut W, entity: &EntityData) -> io::Result<()> {
        write_header(w, &self.options.namespace, &format!("entity '{}'", entity.logical_name))?;
        writeln!(
            w,
            "import {{ EntityProxy, EntityReference, Money }} from \"{}\";",
            RUNTIME_MODULE
        )?;
        for option_set in self.shared_option_sets(entity) {
            writeln!(
                w,
                "import {{ {} }} from \"./{}/{}\";",
                option_set.exposed_name,
                OPTION_SET_DIR,
                to_kebab_case(&option_set.exposed_name)
            )?;
        }
        writeln!(w)?;

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
        writeln!(w, "/** {} */", doc_line(summary))?;
        writeln!(w, "export class {} extends EntityProxy {{", class)?;
        writeln!(
            w,
            "{INDENT}static readonly logicalName = \"{}\";",
            entity.logical_name
        )?;
        if let Some(set_name) = &entity.entity_set_name {
            writeln!(w, "{INDENT}static readonly entitySetName = \"{}\";", set_name)?;
        }
        writeln!(w, "{INDENT}static readonly typeCode = {};", entity.object_type_code)?;
        writeln!(w)?;
        writeln!(w, "{INDENT}constructor(id?: string) {{")?;
        writeln!(w, "{INDENT}{INDENT}super({}.logicalName, id);", class)?;
        writeln!(w, "{INDENT}}}")?;

        for attribute in entity.generated_attributes() {
            writeln!(w)?;
            self.write_attribute(w, entity, attribute)?;
        }

        for fetcher in &entity.collection_fetchers {
            writeln!(w)?;
            writeln!(
                w,
                "{INDENT}/** 1:N {} ({}.{}) */",
                fetcher.relationship_schema_name, fetcher.related_entity, fetcher.related_attribute
            )?;
            writeln!(w, "{INDENT}{}(): Promise<EntityProxy[]> {{", fetcher.accessor_name)?;
            writeln!(
                w,
                "{INDENT}{INDENT}return this.fetchRelated(\"{}\", \"{}\");",
                fetcher.relationship_schema_name, fetcher.related_entity
            )?;
            writeln!(w, "{INDENT}}}")?;
        }

        for fetcher in &entity.intersect_fetchers {
            writeln!(w)?;
            writeln!(
                w,
                "{INDENT}/** N:N {} (via {}) */",
                fetcher.relationship_schema_name, fetcher.intersect_entity
            )?;
            writeln!(w, "{INDENT}{}(): Promise<EntityProxy[]> {{", fetcher.accessor_name)?;
            writeln!(
                w,
                "{INDENT}{INDENT}return this.fetchAssociated(\"{}\", \"{}\");",
                fetcher.relationship_schema_name, fetcher.target_entity
            )?;
            writeln!(w, "{INDENT}}}")?;
        }

        writeln!(w, "}}")?;
        Ok(())
    }

    fn write_attribute<W: Write>(
        &self,
        w: &mut W,
        entity: &EntityData,
        attribute: &AttributeData,
    ) -> io::Result<()> {
        let logical = &attribute.logical_name;
        let name = &attribute.getter.name;
        let value_type = self.value_type(entity, &attribute.getter.value_type);
        let nullable = match attribute.kind {
            AttributeKind::PartyList { .. } => value_type.clone(),
            _ => format!("{} | null", value_type),
        };

        match &attribute.kind {
            AttributeKind::DateTime { behavior } => {
                writeln!(w, "{INDENT}/** {} ({:?}) */", doc_line(&attribute.summary), behavior)?
            }
            _ => writeln!(w, "{INDENT}/** {} */", doc_line(&attribute.summary))?,
        }

        match &attribute.kind {
            AttributeKind::MoneyValue { .. } => writeln!(
                w,
                "{INDENT}get {name}(): {nullable} {{ return this.getValue<Money>(\"{logical}\")?.value ?? null; }}"
            )?,
            AttributeKind::PartyList { .. } => writeln!(
                w,
                "{INDENT}get {name}(): {nullable} {{ return this.getValue<{value_type}>(\"{logical}\") ?? []; }}"
            )?,
            _ => writeln!(
                w,
                "{INDENT}get {name}(): {nullable} {{ return this.getValue<{value_type}>(\"{logical}\"); }}"
            )?,
        }

        if attribute.setter.generate {
            writeln!(w, "{INDENT}set {name}(value: {nullable}) {{")?;
            let body = format!("{INDENT}{INDENT}");

            if let Some((min, max)) = numeric_bounds(attribute) {
                writeln!(w, "{body}if (value !== null && (value < {min} || value > {max})) {{")?;
                writeln!(
                    w,
                    "{body}{INDENT}throw new RangeError(\"{name} must be between {min} and {max}\");"
                )?;
                writeln!(w, "{body}}}")?;
            }

            if let AttributeKind::String {
                max_length: Some(max_length),
            } = attribute.kind
            {
                writeln!(w, "{body}if (value !== null && value.length > {max_length}) {{")?;
                writeln!(
                    w,
                    "{body}{INDENT}throw new RangeError(\"{name} is limited to {max_length} characters\");"
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
                    "{body}if (value !== null && ![{}].includes(value.logicalName)) {{",
                    targets.join(", ")
                )?;
                writeln!(
                    w,
                    "{body}{INDENT}throw new TypeError(`{name} cannot reference ${{value.logicalName}}`);"
                )?;
                writeln!(w, "{body}}}")?;
            }

            match &attribute.kind {
                AttributeKind::MoneyValue { .. } => writeln!(
                    w,
                    "{body}this.setValue(\"{logical}\", value === null ? null : new Money(value));"
                )?,
                _ => writeln!(w, "{body}this.setValue(\"{logical}\", value);")?,
            }
            writeln!(w, "{INDENT}}}")?;
        }

        if attribute.formatted_getter.generate {
            writeln!(
                w,
                "{INDENT}get {}(): string | null {{ return this.getFormattedValue(\"{}\"); }}",
                attribute.formatted_getter.name, logical
            )?;
        }
        Ok(())
    }

    fn write_enum<W: Write>(
        &self,
        w: &mut W,
        entity: &EntityData,
        option_set: &OptionSetData,
    ) -> io::Result<()> {
        writeln!(w, "/** {} */", doc_line(&option_set.display_name))?;
        writeln!(
            w,
            "export enum {} {{",
            enum_type_name(entity, option_set, &self.options)
        )?;
        for option in &option_set.options {
            match option.state {
                Some(state) => writeln!(
                    w,
                    "{INDENT}{} = {}, // state {}",
                    option.name, option.value, state
                )?,
                None => writeln!(w, "{INDENT}{} = {},", option.name, option.value)?,
            }
        }
        writeln!(w, "}}")?;
        Ok(())
    }

    fn write_action<W: Write>(&self, w: &mut W, action: &ActionData) -> io::Result<()> {
        let class = &action.class_name;

        write_header(w, &self.options.namespace, &format!("action '{}'", action.unique_name))?;
        writeln!(
            w,
            "import {{ ActionProxy, EntityReference, Money }} from \"{}\";",
            RUNTIME_MODULE
        )?;
        writeln!(w)?;

        writeln!(w, "export interface {}Request {{", class)?;
        for argument in action.inputs.iter().filter(|a| !a.is_target) {
            write_argument(w, argument)?;
        }
        writeln!(w, "}}")?;
        writeln!(w)?;

        writeln!(w, "export interface {}Response {{", class)?;
        for argument in &action.outputs {
            write_argument(w, argument)?;
        }
        writeln!(w, "}}")?;
        writeln!(w)?;

        writeln!(w, "/** {} */", doc_line(&action.display_name))?;
        writeln!(
            w,
            "export class {0} extends ActionProxy<{0}Request, {0}Response> {{",
            class
        )?;
        writeln!(
            w,
            "{INDENT}static readonly uniqueName = \"{}\";",
            escape_string(&action.unique_name)
        )?;
        match &action.primary_entity {
            Some(entity) => {
                writeln!(w, "{INDENT}static readonly boundEntity = \"{}\";", entity)?;
                writeln!(w)?;
                writeln!(w, "{INDENT}constructor(target: EntityReference) {{")?;
                writeln!(w, "{INDENT}{INDENT}super({}.uniqueName, target);", class)?;
            }
            None => {
                writeln!(w)?;
                writeln!(w, "{INDENT}constructor() {{")?;
                writeln!(w, "{INDENT}{INDENT}super({}.uniqueName, null);", class)?;
            }
        }
        writeln!(w, "{INDENT}}}")?;
        writeln!(w, "}}")?;
        Ok(())
    }
}

impl Emitter for TypeScriptEmitter {
    fn dialect(&self) -> Dialect {
        Dialect::TypeScript
    }

    fn emit_entity(&self, entity: &EntityData) -> Result<EntityUnits> {
        let contents = render(|w| self.write_entity(w, entity))?;

        let mut option_sets = Vec::new();
        for option_set in self.shared_option_sets(entity) {
            let contents = render(|w| {
                write_header(
                    w,
                    &self.options.namespace,
                    &format!("option set '{}'", option_set.logical_name),
                )?;
                self.write_enum(w, entity, option_set)
            })?;
            let path = format!(
                "{}/{}.ts",
                OPTION_SET_DIR,
                to_kebab_case(&option_set.exposed_name)
            );
            option_sets.push(SourceUnit::new(path, contents));
        }

        Ok(EntityUnits {
            entity: SourceUnit::new(format!("{}.ts", to_kebab_case(&entity.class_name)), contents),
            option_sets,
        })
    }

    fn emit_action(&self, action: &ActionData) -> Result<SourceUnit> {
        let contents = render(|w| self.write_action(w, action))?;
        Ok(SourceUnit::new(
            format!("{}.ts", to_kebab_case(&action.class_name)),
            contents,
        ))
    }
}

fn write_header<W: Write>(w: &mut W, namespace: &str, source: &str) -> io::Result<()> {
    writeln!(w, "// {}", namespace)?;
    writeln!(w, "// Generated by crmgen from {}. Do not edit.", source)?;
    writeln!(w)?;
    Ok(())
}

fn argument_type(argument_type: ArgumentType) -> &'static str {
    match argument_type {
        ArgumentType::Boolean => "boolean",
        ArgumentType::DateTime => "Date",
        ArgumentType::Decimal | ArgumentType::Double | ArgumentType::Integer => "number",
        ArgumentType::Money => "Money",
        ArgumentType::String | ArgumentType::Guid => "string",
        ArgumentType::OptionSetValue => "number",
        ArgumentType::EntityReference => "EntityReference",
        ArgumentType::Entity => "Record<string, unknown>",
        ArgumentType::EntityCollection => "Record<string, unknown>[]",
    }
}

fn write_argument<W: Write>(w: &mut W, argument: &ActionArgument) -> io::Result<()> {
    let mut notes = Vec::new();
    if let Some(description) = &argument.description {
        notes.push(doc_line(description));
    }
    if let Some(entity) = &argument.related_entity {
        notes.push(format!("Entity: {}.", entity));
    }
    if !notes.is_empty() {
        writeln!(w, "{INDENT}/** {} */", notes.join(" "))?;
    }
    let optional = if argument.required { "" } else { "?" };
    writeln!(
        w,
        "{INDENT}{}{}: {};",
        argument.name,
        optional,
        argument_type(argument.argument_type)
    )?;
    Ok(())
}
