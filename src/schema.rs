//! Resource schema types.
//!
//! A schema describes the attributes and nested blocks of one resource
//! type. The update path uses it to know which attributes are mutable in
//! place, so that every one of them can be checked against the resource's
//! [`PathMap`](crate::path_map::PathMap).

use std::collections::HashMap;

use crate::path::{AttributePath, PathSegment};

/// The type of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    /// A string value.
    String,
    /// A 64-bit integer.
    Int64,
    /// A boolean value.
    Bool,
    /// A list of values of a single type.
    List(Box<AttributeType>),
    /// A set of unique values of a single type.
    Set(Box<AttributeType>),
    /// A map from string keys to values of a single type.
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// Create a list type.
    pub fn list(element_type: AttributeType) -> Self {
        Self::List(Box::new(element_type))
    }

    /// Create a set type.
    pub fn set(element_type: AttributeType) -> Self {
        Self::Set(Box::new(element_type))
    }

    /// Create a map type.
    pub fn map(element_type: AttributeType) -> Self {
        Self::Map(Box::new(element_type))
    }
}

/// Describes how an attribute can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributeFlags {
    /// The attribute is required in configuration.
    pub required: bool,
    /// The attribute is optional in configuration.
    pub optional: bool,
    /// The attribute is computed by the provider.
    pub computed: bool,
    /// The attribute is sensitive and should be hidden in logs.
    pub sensitive: bool,
}

impl AttributeFlags {
    /// Flags for a required attribute.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    /// Flags for an optional attribute.
    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Default::default()
        }
    }

    /// Flags for a computed, read-only attribute.
    pub fn computed() -> Self {
        Self {
            computed: true,
            ..Default::default()
        }
    }

    /// Flags for an optional attribute the provider may also compute.
    pub fn optional_computed() -> Self {
        Self {
            optional: true,
            computed: true,
            ..Default::default()
        }
    }
}

/// A single attribute in a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// The type of the attribute.
    pub attr_type: AttributeType,
    /// Flags describing how the attribute can be used.
    pub flags: AttributeFlags,
    /// If set, changing this attribute forces resource replacement.
    pub force_new: bool,
}

impl Attribute {
    /// Create a new attribute with the given type and flags.
    pub fn new(attr_type: AttributeType, flags: AttributeFlags) -> Self {
        Self {
            attr_type,
            flags,
            force_new: false,
        }
    }

    /// A required string attribute.
    pub fn required_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::required())
    }

    /// An optional string attribute.
    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::optional())
    }

    /// A computed string attribute.
    pub fn computed_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::computed())
    }

    /// An optional int64 attribute.
    pub fn optional_int64() -> Self {
        Self::new(AttributeType::Int64, AttributeFlags::optional())
    }

    /// An optional list of strings.
    pub fn optional_string_list() -> Self {
        Self::new(
            AttributeType::list(AttributeType::String),
            AttributeFlags::optional(),
        )
    }

    /// An optional string-to-string map, e.g. labels.
    pub fn optional_string_map() -> Self {
        Self::new(
            AttributeType::map(AttributeType::String),
            AttributeFlags::optional(),
        )
    }

    /// Mark this attribute as forcing resource replacement when changed.
    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Mark this attribute as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }

    /// Whether the attribute can change without replacing the resource.
    pub fn is_mutable(&self) -> bool {
        (self.flags.required || self.flags.optional) && !self.force_new
    }
}

/// The nesting mode for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockNestingMode {
    /// A single nested block (at most one).
    #[default]
    Single,
    /// A list of nested blocks (zero or more, ordered).
    List,
    /// A set of nested blocks (zero or more, unordered, unique).
    Set,
    /// A map of nested blocks keyed by string.
    Map,
}

/// A block of attributes and nested blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    /// The attributes within this block.
    pub attributes: HashMap<String, Attribute>,
    /// Nested blocks within this block.
    pub blocks: HashMap<String, NestedBlock>,
}

impl Block {
    /// Create a new empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute to this block.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// Add a nested block to this block.
    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    fn collect_mutable(&self, base: &AttributePath, out: &mut Vec<AttributePath>) {
        for (name, attr) in &self.attributes {
            if attr.is_mutable() {
                out.push(base.clone().field(name.as_str()));
            }
        }
        for (name, nested) in &self.blocks {
            let path = base.clone().field(name.as_str());
            if nested.force_new {
                continue;
            }
            if nested.is_singleton() {
                nested.block.collect_mutable(&path.index(0), out);
            } else {
                out.push(path);
            }
        }
    }
}

/// A nested block with its nesting mode and constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedBlock {
    /// The block definition.
    pub block: Block,
    /// How the block is nested.
    pub nesting_mode: BlockNestingMode,
    /// Minimum number of blocks required.
    pub min_items: u32,
    /// Maximum number of blocks allowed (0 = unlimited).
    pub max_items: u32,
    /// If set, any change inside this block forces replacement.
    pub force_new: bool,
}

impl NestedBlock {
    fn with_mode(block: Block, nesting_mode: BlockNestingMode, max_items: u32) -> Self {
        Self {
            block,
            nesting_mode,
            min_items: 0,
            max_items,
            force_new: false,
        }
    }

    /// A single nested block (0 or 1 allowed).
    pub fn single(block: Block) -> Self {
        Self::with_mode(block, BlockNestingMode::Single, 1)
    }

    /// A list of nested blocks.
    pub fn list(block: Block) -> Self {
        Self::with_mode(block, BlockNestingMode::List, 0)
    }

    /// A set of nested blocks.
    pub fn set(block: Block) -> Self {
        Self::with_mode(block, BlockNestingMode::Set, 0)
    }

    /// A map of nested blocks.
    pub fn map(block: Block) -> Self {
        Self::with_mode(block, BlockNestingMode::Map, 0)
    }

    /// Set the minimum number of blocks required.
    pub fn with_min_items(mut self, min: u32) -> Self {
        self.min_items = min;
        self
    }

    /// Set the maximum number of blocks allowed.
    pub fn with_max_items(mut self, max: u32) -> Self {
        self.max_items = max;
        self
    }

    /// Mark the whole block as forcing replacement.
    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Whether the block holds at most one element and is addressed
    /// through index `0`.
    pub fn is_singleton(&self) -> bool {
        match self.nesting_mode {
            BlockNestingMode::Single => true,
            BlockNestingMode::List => self.max_items == 1,
            BlockNestingMode::Set | BlockNestingMode::Map => false,
        }
    }
}

/// Schema for a resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// The version of this schema.
    pub version: u64,
    /// The root block containing all attributes and nested blocks.
    pub block: Block,
}

impl Schema {
    /// Create a new schema with the given version.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            block: Block::new(),
        }
    }

    /// Create a schema at version 0.
    pub fn v0() -> Self {
        Self::new(0)
    }

    /// Add an attribute to the schema.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.block.attributes.insert(name.into(), attr);
        self
    }

    /// Add a nested block to the schema.
    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.block.blocks.insert(name.into(), block);
        self
    }

    /// Every attribute path that can change in place, sorted.
    ///
    /// Singleton blocks are descended through index `0`; set, map and
    /// unbounded list blocks are reported as a whole, since their elements
    /// have no stable position.
    pub fn mutable_attribute_paths(&self) -> Vec<AttributePath> {
        let mut out = Vec::new();
        self.block.collect_mutable(&AttributePath::root(), &mut out);
        out.sort();
        out
    }

    /// The schema element describing the value at `path`, if any.
    pub fn resolve(&self, path: &AttributePath) -> Option<SchemaNode<'_>> {
        path.segments()
            .iter()
            .try_fold(SchemaNode::Block(&self.block), |node, segment| {
                node.child(segment)
            })
    }
}

/// A position in a schema reached by following an attribute path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaNode<'a> {
    /// A value of an attribute type, or an element of a collection type.
    Value(&'a AttributeType),
    /// A nested block as a whole.
    Nested(&'a NestedBlock),
    /// One element of a nested block, or the root block.
    Block(&'a Block),
}

impl<'a> SchemaNode<'a> {
    /// The node one path segment below this one.
    pub fn child(self, segment: &PathSegment) -> Option<Self> {
        match segment {
            PathSegment::Field(name) => self.field(name),
            PathSegment::Index(_) => self.element(),
        }
    }

    /// The node for key `name` of an object value.
    pub fn field(self, name: &str) -> Option<Self> {
        match self {
            SchemaNode::Block(block) => block
                .attributes
                .get(name)
                .map(|attr| SchemaNode::Value(&attr.attr_type))
                .or_else(|| block.blocks.get(name).map(SchemaNode::Nested)),
            SchemaNode::Nested(nested) if nested.nesting_mode == BlockNestingMode::Map => {
                Some(SchemaNode::Block(&nested.block))
            },
            // A singleton block written as a bare object.
            SchemaNode::Nested(nested) => SchemaNode::Block(&nested.block).field(name),
            SchemaNode::Value(AttributeType::Map(element)) => {
                Some(SchemaNode::Value(element.as_ref()))
            },
            SchemaNode::Value(_) => None,
        }
    }

    /// The node for an element of an array value.
    pub fn element(self) -> Option<Self> {
        match self {
            SchemaNode::Nested(nested) => Some(SchemaNode::Block(&nested.block)),
            SchemaNode::Value(AttributeType::List(element) | AttributeType::Set(element)) => {
                Some(SchemaNode::Value(element.as_ref()))
            },
            // `Index(0)` on a bare object stays on the object.
            SchemaNode::Block(_) => Some(self),
            SchemaNode::Value(_) => None,
        }
    }

    /// Whether values here are unordered collections.
    pub fn is_set(self) -> bool {
        match self {
            SchemaNode::Value(attr_type) => matches!(attr_type, AttributeType::Set(_)),
            SchemaNode::Nested(nested) => nested.nesting_mode == BlockNestingMode::Set,
            SchemaNode::Block(_) => false,
        }
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    /// An error that must be fixed.
    Error,
    /// A warning that should be addressed.
    Warning,
}

/// A diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: DiagnosticSeverity,
    /// A short summary of the issue.
    pub summary: String,
    /// A detailed description of the issue.
    pub detail: Option<String>,
    /// The attribute path where the issue occurred.
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail to this diagnostic.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute path for this diagnostic.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this is an error.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}
