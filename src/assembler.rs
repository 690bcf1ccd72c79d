//! Page assembly: one reference page per documented top-level type, plus TOC entries.

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::component::{Component, JumpListItem, Parameter, Section};
use crate::error::Error;
use crate::formatter::Formatter;
use crate::inline::Inline;
use crate::page::{PageId, ReferencePage};
use crate::reference::Projection;
use crate::symbols::{Accessibility, MemberKind, MemberSymbol, ParameterSymbol, TypeKind, TypeRef, TypeSymbol};
use crate::toc::{Toc, TocBuilder, TocEntry, TypeLabel};
use crate::xml_comment::XmlComment;

/// Compiler-generated or framework-injected type names that never get a page.
const DENIED_NAMES: &[&str] = &["<Module>", "GeneratedInternalTypeHelper"];

/// Namespaces whose types never get a page.
const DENIED_NAMESPACES: &[&str] = &["XamlGeneratedNamespace"];

/// Member groups of a class-like page. `ALL` holds the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    /// Constructors.
    Constructors,
    /// Events.
    Events,
    /// Explicit interface implementations of any member kind.
    ExplicitInterfaceImplementations,
    /// Fields and constants.
    Fields,
    /// Methods.
    Methods,
    /// Operators and conversions.
    Operators,
    /// Properties and indexers.
    Properties,
}

impl Category {
    /// Every category in display order.
    const ALL: [Self; 7] = [
        Self::Constructors,
        Self::Fields,
        Self::Properties,
        Self::Methods,
        Self::Operators,
        Self::ExplicitInterfaceImplementations,
        Self::Events,
    ];

    /// Category a documented member is listed under.
    const fn of(member: &MemberSymbol) -> Self {
        if member.explicit_interface {
            return Self::ExplicitInterfaceImplementations;
        }
        return match member.kind {
            MemberKind::Constructor => Self::Constructors,
            MemberKind::Field => Self::Fields,
            MemberKind::Property => Self::Properties,
            MemberKind::Method => Self::Methods,
            MemberKind::Operator => Self::Operators,
            MemberKind::Event => Self::Events,
        };
    }

    /// Section header text.
    const fn header(self) -> &'static str {
        return match self {
            Self::Constructors => "Constructors",
            Self::Fields => "Fields",
            Self::Properties => "Properties",
            Self::Methods => "Methods",
            Self::Operators => "Operators",
            Self::ExplicitInterfaceImplementations => "Explicit Interface Implementations",
            Self::Events => "Events",
        };
    }
}

/// Which types to skip beyond the built-in deny-lists.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    /// Extra type names to skip.
    pub names: Vec<String>,
    /// Extra namespaces to skip.
    pub namespaces: Vec<String>,
}

impl Exclusions {
    /// Whether `symbol` is deny-listed.
    fn denies(&self, symbol: &TypeSymbol) -> bool {
        let by_name = DENIED_NAMES.contains(&symbol.name.as_str()) || self.names.iter().any(|n| return *n == symbol.name);
        let by_namespace = DENIED_NAMESPACES.contains(&symbol.namespace.as_str())
            || self.namespaces.iter().any(|n| return *n == symbol.namespace);
        return by_name || by_namespace;
    }
}

/// Pages and table of contents for one run.
#[derive(Debug)]
pub struct Assembly {
    /// Pages in page-id order.
    pub pages: Vec<ReferencePage>,
    /// Finalized table of contents.
    pub toc: Toc,
}

/// Builds pages from consolidated type symbols.
#[derive(Debug)]
pub struct Assembler<'f, F> {
    /// Types to skip.
    exclusions: Exclusions,
    /// Source of projections, declarations, and parsed comments.
    formatter: &'f F,
    /// Assemble pages on the rayon pool.
    parallel: bool,
}

impl<'f, F: Formatter> Assembler<'f, F> {
    /// Sequential assembler with only the built-in deny-lists.
    pub fn new(formatter: &'f F) -> Self {
        return Self {
            formatter,
            exclusions: Exclusions::default(),
            parallel: false,
        };
    }

    /// Skip these types in addition to the built-in deny-lists.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: Exclusions) -> Self {
        self.exclusions = exclusions;
        return self;
    }

    /// Assemble pages concurrently.
    #[must_use]
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        return self;
    }

    /// Build a page for every documented type and the table of contents.
    ///
    /// # Errors
    ///
    /// Fails on the first fatal condition: a page-worthy kind with no page
    /// layout, a formatting fault, an invalid page id, or over-deep sections.
    pub fn assemble(&self, symbols: &[&TypeSymbol]) -> Result<Assembly, Error> {
        let toc = TocBuilder::new();
        let built: Vec<Option<ReferencePage>> = if self.parallel {
            symbols.par_iter().map(|symbol| return self.page_for(symbol, &toc)).collect::<Result<_, _>>()?
        } else {
            symbols.iter().map(|symbol| return self.page_for(symbol, &toc)).collect::<Result<_, _>>()?
        };

        let mut pages: Vec<ReferencePage> = built.into_iter().flatten().collect();
        pages.sort_by(|a, b| return a.id.cmp(&b.id));
        return Ok(Assembly {
            pages,
            toc: toc.finalize(),
        });
    }

    /// Build one page and record its TOC entry, or `None` for a skipped type.
    ///
    /// # Errors
    ///
    /// See [`Assembler::assemble`].
    pub fn page_for(&self, symbol: &TypeSymbol, toc: &TocBuilder) -> Result<Option<ReferencePage>, Error> {
        if !self.is_candidate(symbol) {
            return Ok(None);
        }
        let Some(label) = TypeLabel::of(symbol.kind) else {
            tracing::debug!(id = %symbol.id, kind = %symbol.kind, "skipping unrecognized kind");
            return Ok(None);
        };

        let page = self.build_page(symbol)?;
        toc.push(TocEntry {
            namespace: symbol.namespace.clone(),
            label,
            name: symbol.name.clone(),
            page_id: page.id.clone(),
        });
        return Ok(Some(page));
    }

    /// Public and not deny-listed.
    fn is_candidate(&self, symbol: &TypeSymbol) -> bool {
        if symbol.accessibility != Accessibility::Public {
            tracing::debug!(id = %symbol.id, accessibility = ?symbol.accessibility, "skipping inaccessible type");
            return false;
        }
        if self.exclusions.denies(symbol) {
            tracing::debug!(id = %symbol.id, "skipping deny-listed type");
            return false;
        }
        return true;
    }

    /// Header, then the fixed body order: declaration, type parameters,
    /// examples and remarks, kind-specific body, see also.
    fn build_page(&self, symbol: &TypeSymbol) -> Result<ReferencePage, Error> {
        if symbol.kind == TypeKind::FunctionPointer {
            return Err(Error::UnsupportedKind {
                symbol: symbol.id.clone(),
                kind: symbol.kind.to_string(),
            });
        }

        let id = PageId::from_symbol_id(&symbol.id)?;
        let comment = self.formatter.comment(symbol.documentation.as_deref()).unwrap_or_default();

        let mut body = vec![Component::declaration(
            self.formatter.declaration(&symbol.id, symbol.declaration.as_deref())?,
        )];
        if !symbol.type_parameters.is_empty() {
            let parameters = symbol
                .type_parameters
                .iter()
                .map(|name| {
                    return Parameter {
                        name: name.clone(),
                        description: comment.type_params.get(name).cloned().unwrap_or_default(),
                        ..Parameter::default()
                    };
                })
                .collect();
            body.push(Section::new("Type Parameters", vec![Component::ParameterList { parameters }])?.into());
        }
        push_examples_and_remarks(&comment, &mut body)?;

        match symbol.kind {
            TypeKind::Class | TypeKind::Struct | TypeKind::Interface => self.push_members(symbol, &mut body)?,
            TypeKind::Enum => push_enum_fields(self.formatter, symbol, &mut body)?,
            TypeKind::Delegate => self.push_invoke(symbol, &comment, &mut body)?,
            TypeKind::FunctionPointer | TypeKind::Other => {
                return Err(Error::UnsupportedKind {
                    symbol: symbol.id.clone(),
                    kind: symbol.kind.to_string(),
                });
            },
        }

        push_see_also(&comment, &mut body)?;

        let mut page = ReferencePage::new(
            id,
            self.formatter.language().language_id(),
            format!("{} {}", symbol.name, symbol.kind),
            body,
        )?;
        page.summary = comment.summary;
        page.deprecated.clone_from(&symbol.deprecated);
        page.metadata = Some(IndexMap::from([
            ("namespace".to_string(), serde_json::Value::from(symbol.namespace.clone())),
            ("assembly".to_string(), serde_json::Value::from(format!("{}.dll", symbol.module))),
        ]));
        return Ok(page);
    }

    /// Per category: a jump list section, then one detail section per member.
    fn push_members(&self, symbol: &TypeSymbol, body: &mut Vec<Component>) -> Result<(), Error> {
        for category in Category::ALL {
            let mut members: Vec<(String, &MemberSymbol)> = symbol
                .members
                .iter()
                .filter(|m| return m.is_documented() && Category::of(m) == category)
                .map(|m| return (self.signature(m), m))
                .collect();
            if members.is_empty() {
                continue;
            }
            members.sort_by(|(a_sig, a), (b_sig, b)| return a_sig.cmp(b_sig).then_with(|| return a.id.cmp(&b.id)));

            let comments: Vec<XmlComment> = members
                .iter()
                .map(|(_, m)| return self.formatter.comment(m.documentation.as_deref()).unwrap_or_default())
                .collect();

            let jumplist = members
                .iter()
                .zip(&comments)
                .map(|((signature, member), comment)| {
                    return JumpListItem {
                        name: self.member_inline(member, signature),
                        description: comment.summary.clone().unwrap_or_default(),
                        deprecated: member.is_deprecated(),
                    };
                })
                .collect();
            body.push(Section::new(category.header(), vec![Component::JumpList { jumplist }])?.into());

            for ((signature, member), comment) in members.iter().zip(&comments) {
                body.push(self.member_detail(signature, member, comment)?.into());
            }
        }
        return Ok(());
    }

    /// Detail section for one member; every subsection is one level down.
    fn member_detail(&self, signature: &str, member: &MemberSymbol, comment: &XmlComment) -> Result<Section, Error> {
        let mut detail = Vec::new();
        if let Some(summary) = &comment.summary {
            detail.push(Component::markdown(summary.clone()));
        }
        detail.push(Component::declaration(
            self.formatter.declaration(&member.id, member.declaration.as_deref())?,
        ));
        if !member.parameters.is_empty() {
            detail.push(self.parameters_section(&member.parameters, comment)?.into());
        }
        if let Some(value) = self.value_block(member, comment)? {
            detail.push(value.into());
        }
        if !comment.exceptions.is_empty() {
            let parameters = comment
                .exceptions
                .iter()
                .map(|exception| {
                    let type_ref = TypeRef {
                        display: exception.type_id.clone(),
                        id: Some(exception.type_id.clone()),
                    };
                    return Parameter {
                        description: exception.description.clone(),
                        type_ref: Some(self.formatter.type_inline(&type_ref)),
                        ..Parameter::default()
                    };
                })
                .collect();
            detail.push(Section::new("Exceptions", vec![Component::ParameterList { parameters }])?.into());
        }
        push_examples_and_remarks(comment, &mut detail)?;
        push_see_also(comment, &mut detail)?;
        return Section::new(signature, detail);
    }

    /// `Returns`, `Property Value`, `Field Value`, or `Event Type`; nothing for
    /// constructors, void methods, or members without a type.
    fn value_block(&self, member: &MemberSymbol, comment: &XmlComment) -> Result<Option<Section>, Error> {
        let Some(type_ref) = &member.type_ref else {
            return Ok(None);
        };
        let (header, description) = match member.kind {
            MemberKind::Constructor => return Ok(None),
            MemberKind::Method | MemberKind::Operator if type_ref.is_void() => return Ok(None),
            MemberKind::Method | MemberKind::Operator => ("Returns", &comment.returns),
            MemberKind::Property => ("Property Value", &comment.value),
            MemberKind::Field => ("Field Value", &comment.value),
            MemberKind::Event => ("Event Type", &comment.value),
        };
        return self.value_section(header, type_ref, description.as_deref()).map(Some);
    }

    /// One-entry parameter list carrying a type and its description.
    fn value_section(&self, header: &str, type_ref: &TypeRef, description: Option<&str>) -> Result<Section, Error> {
        let value = Parameter {
            description: description.unwrap_or_default().to_string(),
            type_ref: Some(self.formatter.type_inline(type_ref)),
            ..Parameter::default()
        };
        return Section::new(header, vec![Component::ParameterList { parameters: vec![value] }]);
    }

    /// `Parameters` section with names, types, defaults, and descriptions.
    fn parameters_section(&self, parameters: &[ParameterSymbol], comment: &XmlComment) -> Result<Section, Error> {
        let parameters = parameters
            .iter()
            .map(|p| {
                return Parameter {
                    name: p.name.clone(),
                    description: comment.params.get(&p.name).cloned().unwrap_or_default(),
                    type_ref: Some(self.formatter.type_inline(&p.type_ref)),
                    required: p.optional.then_some(false),
                    default: p.default_value.clone(),
                    ..Parameter::default()
                };
            })
            .collect();
        return Section::new("Parameters", vec![Component::ParameterList { parameters }]);
    }

    /// Delegate body: the `Invoke` signature's parameters and return value.
    fn push_invoke(&self, symbol: &TypeSymbol, comment: &XmlComment, body: &mut Vec<Component>) -> Result<(), Error> {
        let invoke = symbol
            .members
            .iter()
            .find(|m| return m.kind == MemberKind::Method && m.name == "Invoke")
            .ok_or_else(|| {
                return Error::FormattingFault {
                    symbol: symbol.id.clone(),
                    reason: "delegate has no Invoke method".to_string(),
                };
            })?;

        if !invoke.parameters.is_empty() {
            body.push(self.parameters_section(&invoke.parameters, comment)?.into());
        }
        if let Some(returns) = invoke.type_ref.as_ref().filter(|t| return !t.is_void()) {
            body.push(self.value_section("Returns", returns, comment.returns.as_deref())?.into());
        }
        return Ok(());
    }

    /// Jump-list and header text: `name` projection, then the extracted
    /// signature, then the bare name.
    fn signature(&self, member: &MemberSymbol) -> String {
        if let Some(tokens) = self.formatter.tokens(&member.id, Projection::Name) {
            return Inline::from_link_items(tokens).plain_text();
        }
        return member.signature.clone().unwrap_or_else(|| return member.name.clone());
    }

    /// Jump-list name, linked when the projection carries hrefs.
    fn member_inline(&self, member: &MemberSymbol, signature: &str) -> Inline {
        return match self.formatter.tokens(&member.id, Projection::Name) {
            Some(tokens) => Inline::from_link_items(tokens),
            None => Inline::Text(signature.to_string()),
        };
    }
}

/// Enum body: a `Fields` parameter list of its constants, omitted if empty.
fn push_enum_fields<F: Formatter>(formatter: &F, symbol: &TypeSymbol, body: &mut Vec<Component>) -> Result<(), Error> {
    let parameters: Vec<Parameter> = symbol
        .members
        .iter()
        .filter(|m| return m.kind == MemberKind::Field && m.is_static && m.is_documented())
        .map(|field| {
            let comment = formatter.comment(field.documentation.as_deref()).unwrap_or_default();
            return Parameter {
                name: field.name.clone(),
                description: comment.summary.unwrap_or_default(),
                default: field.constant_value.clone(),
                deprecated: field.is_deprecated(),
                ..Parameter::default()
            };
        })
        .collect();
    if !parameters.is_empty() {
        body.push(Section::new("Fields", vec![Component::ParameterList { parameters }])?.into());
    }
    return Ok(());
}

/// `Examples` and `Remarks` sections, each only when documented.
fn push_examples_and_remarks(comment: &XmlComment, body: &mut Vec<Component>) -> Result<(), Error> {
    if !comment.examples.is_empty() {
        let examples = comment.examples.iter().map(Component::markdown).collect();
        body.push(Section::new("Examples", examples)?.into());
    }
    if let Some(remarks) = &comment.remarks {
        body.push(Section::new("Remarks", vec![Component::markdown(remarks.clone())])?.into());
    }
    return Ok(());
}

/// `See also` section as a markdown list.
fn push_see_also(comment: &XmlComment, body: &mut Vec<Component>) -> Result<(), Error> {
    if comment.see_also.is_empty() {
        return Ok(());
    }
    let list: Vec<String> = comment.see_also.iter().map(|entry| return format!("- {entry}")).collect();
    body.push(Section::new("See also", vec![Component::markdown(list.join("\n"))])?.into());
    return Ok(());
}
