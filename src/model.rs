//! The object graph a completed parse produces: [`File`] owns five arenas (strings, types,
//! prototypes, fields, methods) plus a class map, and every cross-reference is a `u32` index into
//! one of those arenas rather than a smart pointer — see the Design Notes on cyclic
//! back-references for why.

use std::collections::{BTreeMap, HashMap};

use bitflags::bitflags;

use crate::header::NO_INDEX;

pub type StringIdx = u32;
pub type TypeIdx = u32;
pub type ProtoIdx = u32;
pub type FieldIdx = u32;
pub type MethodIdx = u32;
pub type ClassIdx = u32;

bitflags! {
    /// Typed view over the raw `access_flags` bitfield shared by classes, fields, and methods.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const BRIDGE = 0x0040;
        const TRANSIENT = 0x0080;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const CONSTRUCTOR = 0x0001_0000;
        const DECLARED_SYNCHRONIZED = 0x0002_0000;
    }
}

impl AccessFlags {
    pub fn is_public(self) -> bool {
        self.contains(AccessFlags::PUBLIC)
    }

    pub fn is_static(self) -> bool {
        self.contains(AccessFlags::STATIC)
    }

    pub fn is_interface(self) -> bool {
        self.contains(AccessFlags::INTERFACE)
    }

    pub fn is_constructor(self) -> bool {
        self.contains(AccessFlags::CONSTRUCTOR)
    }
}

/// Classification of a [`Type`]'s descriptor by its leading character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Primitive,
    Class,
    Array,
    Unknown,
}

impl TypeKind {
    pub fn classify(descriptor: &str) -> TypeKind {
        match descriptor.as_bytes().first() {
            Some(b'V' | b'B' | b'S' | b'C' | b'I' | b'J' | b'F' | b'D' | b'Z') => TypeKind::Primitive,
            Some(b'L') => TypeKind::Class,
            Some(b'[') => TypeKind::Array,
            _ => TypeKind::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Type {
    pub descriptor: StringIdx,
    pub kind: TypeKind,
    /// Resolved by the Resolver's `resolve_types` pass when `kind` is `Class` or an array whose
    /// element is a class; `None` until then, and `None` forever for primitives/unknowns.
    pub class: Option<ClassIdx>,
}

impl Type {
    /// The descriptor with every leading `[` stripped — the element type of an array, or the
    /// descriptor itself for a non-array type.
    pub fn element_descriptor(descriptor: &str) -> &str {
        descriptor.trim_start_matches('[')
    }
}

#[derive(Debug, Clone)]
pub struct Prototype {
    pub shorty_idx: StringIdx,
    pub return_type: TypeIdx,
    pub parameters: Vec<TypeIdx>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: StringIdx,
    pub declaring_class_descriptor: StringIdx,
    pub type_: TypeIdx,
    pub parent: Option<ClassIdx>,
    pub access_flags: AccessFlags,
    pub is_static: bool,
    pub original_index: FieldIdx,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: StringIdx,
    pub declaring_class_descriptor: StringIdx,
    pub proto: ProtoIdx,
    pub parent: Option<ClassIdx>,
    pub access_flags: AccessFlags,
    pub is_virtual: bool,
    /// `insns_size * 2` bytes of raw bytecode starting immediately after the `code_item` header,
    /// as an `(offset, length)` pair into the original buffer — undecoded, per scope.
    pub code: Option<(u32, u32)>,
    pub original_index: MethodIdx,
}

impl Method {
    pub fn is_constructor_name(name: &str) -> bool {
        name == "<init>" || name == "<clinit>"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassState {
    Local,
    External,
}

#[derive(Debug, Clone)]
pub struct Class {
    pub descriptor: StringIdx,
    pub descriptor_str: String,
    pub access_flags: AccessFlags,
    pub superclass: Option<ClassIdx>,
    pub source_file: Option<StringIdx>,
    pub fields: Vec<FieldIdx>,
    pub methods: Vec<MethodIdx>,
    pub original_index: Option<ClassIdx>,
    /// Raw offsets carried verbatim, never decoded (spec.md §9 Open Questions): 0 means absent,
    /// nonzero means present-but-undecoded, distinguishable by callers.
    pub interfaces_off: u32,
    pub annotations_off: u32,
    pub state: ClassState,
}

impl Class {
    pub fn is_external(&self) -> bool {
        self.state == ClassState::External
    }
}

/// A method-handle pool entry (supplemented from original_source/teacher, see SPEC_FULL §10.4):
/// an uninterpreted reference to a field-or-method of the given kind.
#[derive(Debug, Clone, Copy)]
pub struct MethodHandle {
    pub kind: u16,
    pub field_or_method_id: u32,
}

/// A call-site pool entry: an uninterpreted offset into the data section pointing at an
/// encoded-array payload (SPEC_FULL §10.4).
#[derive(Debug, Clone, Copy)]
pub struct CallSite {
    pub call_site_off: u32,
}

/// The completed object graph. Every field after the five arenas is either a lookup index or a
/// transient map that must be empty once [`crate::parse`] returns (spec.md §8).
#[derive(Debug, Clone, Default)]
pub struct File {
    /// The raw input buffer this `File` was parsed from. `Method::code` offsets index into it.
    pub data: Vec<u8>,
    pub strings: Vec<String>,
    pub types: Vec<Type>,
    pub prototypes: Vec<Prototype>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub classes: Vec<Class>,
    pub method_handles: Vec<MethodHandle>,
    pub call_sites: Vec<CallSite>,

    /// descriptor string -> class index, the File's class map from spec.md §3.
    pub class_by_descriptor: HashMap<String, ClassIdx>,

    /// descriptor (string, not interned) -> type index, used by the resolver to classify
    /// array-of-class element types without re-scanning the type pool.
    pub class_type_map: BTreeMap<String, Vec<TypeIdx>>,

    pub(crate) class_field_map: BTreeMap<String, Vec<FieldIdx>>,
    pub(crate) class_method_map: BTreeMap<String, Vec<MethodIdx>>,
    pub(crate) inheritance: BTreeMap<String, Vec<ClassIdx>>,
}

impl File {
    pub fn string_at(&self, idx: StringIdx) -> Option<&str> {
        self.strings.get(idx as usize).map(|s| s.as_str())
    }

    pub fn type_at(&self, idx: TypeIdx) -> Option<&Type> {
        self.types.get(idx as usize)
    }

    pub fn prototype_at(&self, idx: ProtoIdx) -> Option<&Prototype> {
        self.prototypes.get(idx as usize)
    }

    pub fn field_at(&self, idx: FieldIdx) -> Option<&Field> {
        self.fields.get(idx as usize)
    }

    pub fn method_at(&self, idx: MethodIdx) -> Option<&Method> {
        self.methods.get(idx as usize)
    }

    pub fn class_at(&self, idx: ClassIdx) -> Option<&Class> {
        self.classes.get(idx as usize)
    }

    pub fn class_by_name(&self, descriptor: &str) -> Option<ClassIdx> {
        self.class_by_descriptor.get(descriptor).copied()
    }

    /// All resolution maps consumed and empty (spec.md §8 invariant).
    pub fn is_fully_resolved(&self) -> bool {
        self.class_field_map.is_empty() && self.class_method_map.is_empty() && self.inheritance.is_empty()
    }

    /// The raw, undecoded bytecode slice for `method`, if it has code attached.
    pub fn bytecode(&self, method: &Method) -> Option<&[u8]> {
        let (off, len) = method.code?;
        self.data.get(off as usize..(off as usize + len as usize))
    }
}

pub fn is_no_index(value: u32) -> bool {
    value == NO_INDEX
}
