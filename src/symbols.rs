//! Symbol stream handed over by the extraction collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::page::Deprecation;

/// Top-level type kind as reported by extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    /// Reference type.
    Class,
    /// Delegate.
    Delegate,
    /// Enumeration.
    Enum,
    /// Unmanaged function pointer; listed with delegates but has no page layout.
    FunctionPointer,
    /// Interface.
    Interface,
    /// Value type.
    Struct,
    /// Anything else (modules, type parameters, …). Never documented.
    #[serde(other)]
    Other,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Class => "Class",
            Self::Struct => "Struct",
            Self::Interface => "Interface",
            Self::Enum => "Enum",
            Self::Delegate => "Delegate",
            Self::FunctionPointer => "FunctionPointer",
            Self::Other => "Other",
        };
        return f.write_str(label);
    }
}

/// Declared accessibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Accessibility {
    /// `internal`.
    Internal,
    /// `protected` or `protected internal`.
    Protected,
    /// `public`.
    Public,
    /// `private`, `private protected`, or unknown.
    #[default]
    #[serde(other)]
    Private,
}

/// Member kind within a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberKind {
    /// Instance or static constructor.
    Constructor,
    /// Event.
    Event,
    /// Field, including enum constants.
    Field,
    /// Ordinary method.
    Method,
    /// Operator or conversion.
    Operator,
    /// Property or indexer.
    Property,
}

/// A reference to a type as it appears in a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Text to show when no projection is available, e.g. `List<Widget>`.
    pub display: String,
    /// Reference id to look up merged projections under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl TypeRef {
    /// Whether this is the `void` return type.
    pub fn is_void(&self) -> bool {
        return self.id.as_deref() == Some("System.Void") || self.display == "void";
    }
}

/// One parameter of a method, constructor, indexer, or delegate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSymbol {
    /// Default value as source text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Parameter name.
    pub name: String,
    /// Whether the parameter may be omitted.
    #[serde(default)]
    pub optional: bool,
    /// Parameter type.
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

/// A member of a top-level type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSymbol {
    /// Declared accessibility.
    #[serde(default)]
    pub accessibility: Accessibility,
    /// Literal constant value, for constants and enum fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant_value: Option<String>,
    /// Full declaration text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<String>,
    /// Deprecation flag or reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
    /// XML documentation blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Explicit interface implementation.
    #[serde(default)]
    pub explicit_interface: bool,
    /// Stable member id, e.g. `Contoso.Widget.Spin(System.Int32)`.
    pub id: String,
    /// Inherited from a base type rather than declared here.
    #[serde(default)]
    pub inherited: bool,
    /// `static` member.
    #[serde(default)]
    pub is_static: bool,
    /// Member kind.
    pub kind: MemberKind,
    /// Simple name.
    pub name: String,
    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterSymbol>,
    /// Jump-list signature, e.g. `Spin(int turns)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Return, property, field, or event type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
}

impl MemberSymbol {
    /// Whether the member belongs on its type's page.
    pub fn is_documented(&self) -> bool {
        if self.inherited {
            return false;
        }
        return self.explicit_interface
            || matches!(self.accessibility, Accessibility::Public | Accessibility::Protected);
    }

    /// Whether the member is marked deprecated.
    pub fn is_deprecated(&self) -> bool {
        return self.deprecated.as_ref().is_some_and(Deprecation::is_deprecated);
    }
}

/// A top-level type in the symbol stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSymbol {
    /// Declared accessibility.
    #[serde(default)]
    pub accessibility: Accessibility,
    /// Full declaration text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<String>,
    /// Deprecation flag or reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
    /// XML documentation blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Full type name, e.g. ``Contoso.Box`1``.
    pub id: String,
    /// Type kind.
    pub kind: TypeKind,
    /// Declared members.
    #[serde(default)]
    pub members: Vec<MemberSymbol>,
    /// Declaring module, filled from the manifest.
    #[serde(default)]
    pub module: String,
    /// Formatted display name, e.g. `Box<T>`.
    pub name: String,
    /// Containing namespace; empty for the global namespace.
    #[serde(default)]
    pub namespace: String,
    /// Type parameter names in order.
    #[serde(default)]
    pub type_parameters: Vec<String>,
}

impl TypeSymbol {
    /// Fold a partial declaration of the same type into this one. Members are
    /// unioned by id (first wins); optional fields are filled where missing.
    pub fn absorb(&mut self, other: Self) {
        if self.namespace.is_empty() {
            self.namespace = other.namespace;
        }
        if self.module.is_empty() {
            self.module = other.module;
        }
        if self.declaration.is_none() {
            self.declaration = other.declaration;
        }
        if self.documentation.is_none() {
            self.documentation = other.documentation;
        }
        if self.deprecated.is_none() {
            self.deprecated = other.deprecated;
        }
        if self.type_parameters.is_empty() {
            self.type_parameters = other.type_parameters;
        }
        for member in other.members {
            if !self.members.iter().any(|m| return m.id == member.id) {
                self.members.push(member);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, kind: MemberKind) -> MemberSymbol {
        return MemberSymbol {
            id: id.to_string(),
            kind,
            name: id.rsplit('.').next().unwrap_or(id).to_string(),
            signature: None,
            declaration: None,
            accessibility: Accessibility::Public,
            is_static: false,
            explicit_interface: false,
            inherited: false,
            parameters: Vec::new(),
            type_ref: None,
            constant_value: None,
            documentation: None,
            deprecated: None,
        };
    }

    #[test]
    fn unknown_kind_and_accessibility_fall_back() {
        let json = serde_json::json!({
            "id": "Contoso.Thing", "name": "Thing", "kind": "module", "accessibility": "privateProtected"
        });
        let symbol: TypeSymbol = serde_json::from_value(json).unwrap();
        assert_eq!(symbol.kind, TypeKind::Other);
        assert_eq!(symbol.accessibility, Accessibility::Private);
    }

    #[test]
    fn absorb_unions_members_and_fills_gaps() {
        let json = serde_json::json!({ "id": "Contoso.Widget", "name": "Widget", "kind": "class" });
        let mut first: TypeSymbol = serde_json::from_value(json.clone()).unwrap();
        first.members.push(member("Contoso.Widget.Spin", MemberKind::Method));

        let mut second: TypeSymbol = serde_json::from_value(json).unwrap();
        second.documentation = Some("<summary>A widget.</summary>".to_string());
        second.members.push(member("Contoso.Widget.Spin", MemberKind::Method));
        second.members.push(member("Contoso.Widget.Size", MemberKind::Property));

        first.absorb(second);
        let ids: Vec<&str> = first.members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["Contoso.Widget.Spin", "Contoso.Widget.Size"]);
        assert!(first.documentation.is_some());
    }

    #[test]
    fn member_visibility_rules() {
        let mut m = member("Contoso.Widget.Reset", MemberKind::Method);
        assert!(m.is_documented());
        m.accessibility = Accessibility::Private;
        assert!(!m.is_documented());
        m.explicit_interface = true;
        assert!(m.is_documented());
        m.inherited = true;
        assert!(!m.is_documented());
    }

    #[test]
    fn void_detection() {
        let by_id = TypeRef { display: "Void".to_string(), id: Some("System.Void".to_string()) };
        let by_text = TypeRef { display: "void".to_string(), id: None };
        let int = TypeRef { display: "int".to_string(), id: Some("System.Int32".to_string()) };
        assert!(by_id.is_void());
        assert!(by_text.is_void());
        assert!(!int.is_void());
    }
}
