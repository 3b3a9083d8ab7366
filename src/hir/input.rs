//! Syntactic input: the declarations a class-like body owns.
//!
//! This is an input to the session: the caller builds it from its parse
//! tree and registers it, and every member query derives from it. Nothing
//! here is lazy.

use indexmap::IndexMap;

use crate::base::{Name, SourceRef};
use super::descriptors::{Signature, Type, Visibility};
use super::ids::ClassId;

/// The flavor of a class-like declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Object,
    Enum,
    Annotation,
}

impl ClassKind {
    /// Whether declarations of this kind get a primary constructor.
    pub fn has_primary_constructor(self) -> bool {
        matches!(
            self,
            ClassKind::Class | ClassKind::Object | ClassKind::Enum | ClassKind::Annotation
        )
    }

    /// Keyword-ish label for messages.
    pub fn display(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Object => "object",
            ClassKind::Enum => "enum class",
            ClassKind::Annotation => "annotation class",
        }
    }
}

/// `val` or `var` marker on a constructor parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValOrVar {
    Val,
    Var,
}

/// A `fun` declared in a class body.
#[derive(Clone, Debug)]
pub struct FunctionDeclaration {
    pub name: Name,
    pub signature: Signature,
    /// Explicit visibility modifier, if written.
    pub visibility: Option<Visibility>,
    pub source: SourceRef,
}

impl FunctionDeclaration {
    pub fn new(name: Name, signature: Signature, source: SourceRef) -> Self {
        Self {
            name,
            signature,
            visibility: None,
            source,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// A `val`/`var` declared in a class body.
#[derive(Clone, Debug)]
pub struct PropertyDeclaration {
    pub name: Name,
    pub ty: Type,
    pub mutable: bool,
    pub visibility: Option<Visibility>,
    pub source: SourceRef,
}

impl PropertyDeclaration {
    pub fn new(name: Name, ty: Type, source: SourceRef) -> Self {
        Self {
            name,
            ty,
            mutable: false,
            visibility: None,
            source,
        }
    }

    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// A primary-constructor parameter.
#[derive(Clone, Debug)]
pub struct ParameterDeclaration {
    pub name: Name,
    pub ty: Type,
    /// `Some` when the parameter also introduces a property.
    pub val_or_var: Option<ValOrVar>,
    pub visibility: Option<Visibility>,
    pub source: SourceRef,
}

impl ParameterDeclaration {
    /// A plain parameter that introduces no property.
    pub fn new(name: Name, ty: Type, source: SourceRef) -> Self {
        Self {
            name,
            ty,
            val_or_var: None,
            visibility: None,
            source,
        }
    }

    pub fn val(mut self) -> Self {
        self.val_or_var = Some(ValOrVar::Val);
        self
    }

    pub fn var(mut self) -> Self {
        self.val_or_var = Some(ValOrVar::Var);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn introduces_property(&self) -> bool {
        self.val_or_var.is_some()
    }
}

/// An enum entry nested in an enum class body.
#[derive(Clone, Debug)]
pub struct EnumEntryDeclaration {
    pub name: Name,
    /// Entries with a body of their own may declare a primary constructor.
    pub has_primary_constructor: bool,
    /// The entry's own class descriptor, when the caller registered one.
    pub class: Option<ClassId>,
    pub source: SourceRef,
}

impl EnumEntryDeclaration {
    pub fn new(name: Name, source: SourceRef) -> Self {
        Self {
            name,
            has_primary_constructor: false,
            class: None,
            source,
        }
    }

    pub fn with_primary_constructor(mut self) -> Self {
        self.has_primary_constructor = true;
        self
    }

    pub fn with_class(mut self, class: ClassId) -> Self {
        self.class = Some(class);
        self
    }
}

/// A class-or-object declaration nested in a class body.
#[derive(Clone, Debug)]
pub enum NestedDeclaration {
    ClassOrObject {
        name: Name,
        kind: ClassKind,
        source: SourceRef,
    },
    EnumEntry(EnumEntryDeclaration),
}

impl NestedDeclaration {
    pub fn name(&self) -> Name {
        match self {
            NestedDeclaration::ClassOrObject { name, .. } => *name,
            NestedDeclaration::EnumEntry(entry) => entry.name,
        }
    }
}

/// A borrowed view of one callable member declaration.
#[derive(Clone, Copy, Debug)]
pub enum MemberDeclaration<'a> {
    Function(&'a FunctionDeclaration),
    Property(&'a PropertyDeclaration),
}

impl MemberDeclaration<'_> {
    pub fn name(&self) -> Name {
        match self {
            MemberDeclaration::Function(decl) => decl.name,
            MemberDeclaration::Property(decl) => decl.name,
        }
    }
}

/// Header facts about the owning declaration.
#[derive(Clone, Debug)]
pub struct ClassLikeInfo {
    pub name: Name,
    pub kind: ClassKind,
    pub source: SourceRef,
    /// Supertype names in declaration order, resolved through the session.
    pub supertypes: Vec<Name>,
}

/// The syntactic content of one class-like declaration.
///
/// Declarations are grouped by name in declaration order so a per-name
/// query never scans the whole body.
#[derive(Clone, Debug)]
pub struct ClassDeclaration {
    info: ClassLikeInfo,
    functions: IndexMap<Name, Vec<FunctionDeclaration>>,
    properties: IndexMap<Name, Vec<PropertyDeclaration>>,
    nested: IndexMap<Name, NestedDeclaration>,
    parameters: Vec<ParameterDeclaration>,
}

impl ClassDeclaration {
    pub fn new(name: Name, kind: ClassKind, source: SourceRef) -> Self {
        Self {
            info: ClassLikeInfo {
                name,
                kind,
                source,
                supertypes: Vec::new(),
            },
            functions: IndexMap::new(),
            properties: IndexMap::new(),
            nested: IndexMap::new(),
            parameters: Vec::new(),
        }
    }

    pub fn with_supertype(mut self, name: Name) -> Self {
        self.info.supertypes.push(name);
        self
    }

    pub fn with_function(mut self, decl: FunctionDeclaration) -> Self {
        self.functions.entry(decl.name).or_default().push(decl);
        self
    }

    pub fn with_property(mut self, decl: PropertyDeclaration) -> Self {
        self.properties.entry(decl.name).or_default().push(decl);
        self
    }

    pub fn with_parameter(mut self, decl: ParameterDeclaration) -> Self {
        self.parameters.push(decl);
        self
    }

    /// Add a nested declaration. A later declaration with the same name
    /// replaces the earlier one.
    pub fn with_nested(mut self, decl: NestedDeclaration) -> Self {
        self.nested.insert(decl.name(), decl);
        self
    }

    pub fn with_enum_entry(self, entry: EnumEntryDeclaration) -> Self {
        self.with_nested(NestedDeclaration::EnumEntry(entry))
    }

    pub fn owner_info(&self) -> &ClassLikeInfo {
        &self.info
    }

    pub fn name(&self) -> Name {
        self.info.name
    }

    pub fn kind(&self) -> ClassKind {
        self.info.kind
    }

    pub fn supertypes(&self) -> &[Name] {
        &self.info.supertypes
    }

    pub fn functions_named(&self, name: Name) -> &[FunctionDeclaration] {
        self.functions.get(&name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn properties_named(&self, name: Name) -> &[PropertyDeclaration] {
        self.properties.get(&name).map(Vec::as_slice).unwrap_or_default()
    }

    /// All function and property declarations, functions first.
    pub fn member_declarations(&self) -> impl Iterator<Item = MemberDeclaration<'_>> + '_ {
        let functions = self.functions.values().flatten().map(MemberDeclaration::Function);
        let properties = self.properties.values().flatten().map(MemberDeclaration::Property);
        functions.chain(properties)
    }

    pub fn primary_constructor_parameters(&self) -> &[ParameterDeclaration] {
        &self.parameters
    }

    pub fn class_or_object_declaration(&self, name: Name) -> Option<&NestedDeclaration> {
        self.nested.get(&name)
    }

    pub fn nested_declarations(&self) -> impl Iterator<Item = &NestedDeclaration> + '_ {
        self.nested.values()
    }
}
