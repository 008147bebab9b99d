//! Canonical type system
//!
//! Every type shape is interned in a [`TypeTable`] so that structurally
//! identical types share one [`TypeId`]. Struct types keep a nominal
//! identity (a monotonically assigned [`StructId`]) and are never compared
//! by structure. A const-qualified type is a separate interned instance of
//! the same shape; an alias is a named wrapper that every query looks
//! through.

mod conversion;

pub use conversion::Conversion;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Handle of an interned type. Only meaningful for the table that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Nominal identity of a struct type. Never reused within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructId(u32);

impl StructId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    pub fn bits(self) -> u16 {
        match self {
            FloatWidth::F32 => 32,
            FloatWidth::F64 => 64,
        }
    }
}

/// Shape of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Void,
    Bool,
    Integer { bits: u16, signed: bool },
    Float(FloatWidth),
    /// Pointer to the referenced type; `None` is the type of `nullptr`
    Pointer(Option<TypeId>),
    /// `dim == 0` denotes an unbound array
    Array { element: TypeId, dim: u64 },
    Function { ret: TypeId, params: Vec<TypeId>, variadic: bool },
    Struct(StructId),
    Alias { name: String, target: TypeId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("'{ty}' is not a struct type")]
    NotAStruct { ty: String },

    #[error("struct {name} is already complete")]
    DuplicateCompletion { name: String },

    #[error("struct {name} has no member '{member}'")]
    UnknownMember { name: String, member: String },

    #[error("use of incomplete type 'struct {name}'")]
    IncompleteStruct { name: String },

    #[error("duplicate member '{member}' in struct {name}")]
    DuplicateMember { name: String, member: String },

    #[error("member '{member}' of struct {name} has incomplete type")]
    IncompleteMember { name: String, member: String },

    #[error("struct {name}: {names} member names but {types} member types")]
    MemberCountMismatch { name: String, names: usize, types: usize },
}

#[derive(Debug, Clone)]
struct TypeData {
    kind: TypeKind,
    is_const: bool,
}

#[derive(Debug, Clone)]
struct StructData {
    name: String,
    members: Option<Vec<Member>>,
    removed: bool,
}

/// Session-wide intern tables
///
/// One ordered-unique collection per shape kind maps the shape parameters
/// (plus the const flag) to the single instance of that type.
#[derive(Debug, Clone)]
pub struct TypeTable {
    types: Vec<TypeData>,
    voids: BTreeMap<bool, TypeId>,
    bools: BTreeMap<bool, TypeId>,
    integers: BTreeMap<(u16, bool, bool), TypeId>,
    floats: BTreeMap<(FloatWidth, bool), TypeId>,
    pointers: BTreeMap<(Option<TypeId>, bool), TypeId>,
    arrays: BTreeMap<(TypeId, u64, bool), TypeId>,
    functions: BTreeMap<(TypeId, Vec<TypeId>, bool, bool), TypeId>,
    aliases: BTreeMap<(String, TypeId), TypeId>,
    struct_types: BTreeMap<(StructId, bool), TypeId>,
    structs: Vec<StructData>,
    size_type_bits: u16,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::with_size_type_bits(64)
    }

    /// Table whose platform size type is an unsigned integer of `bits`
    pub fn with_size_type_bits(bits: u16) -> Self {
        Self {
            types: Vec::new(),
            voids: BTreeMap::new(),
            bools: BTreeMap::new(),
            integers: BTreeMap::new(),
            floats: BTreeMap::new(),
            pointers: BTreeMap::new(),
            arrays: BTreeMap::new(),
            functions: BTreeMap::new(),
            aliases: BTreeMap::new(),
            struct_types: BTreeMap::new(),
            structs: Vec::new(),
            size_type_bits: bits,
        }
    }

    /// Number of distinct type instances created so far
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn data(&self, ty: TypeId) -> &TypeData {
        &self.types[ty.index()]
    }

    fn intern(&mut self, kind: TypeKind, is_const: bool) -> TypeId {
        let existing = match &kind {
            TypeKind::Void => self.voids.get(&is_const).copied(),
            TypeKind::Bool => self.bools.get(&is_const).copied(),
            TypeKind::Integer { bits, signed } => {
                self.integers.get(&(*bits, *signed, is_const)).copied()
            }
            TypeKind::Float(width) => self.floats.get(&(*width, is_const)).copied(),
            TypeKind::Pointer(pointee) => self.pointers.get(&(*pointee, is_const)).copied(),
            TypeKind::Array { element, dim } => {
                self.arrays.get(&(*element, *dim, is_const)).copied()
            }
            TypeKind::Function { ret, params, variadic } => self
                .functions
                .get(&(*ret, params.clone(), *variadic, is_const))
                .copied(),
            TypeKind::Struct(id) => self.struct_types.get(&(*id, is_const)).copied(),
            TypeKind::Alias { name, target } => {
                self.aliases.get(&(name.clone(), *target)).copied()
            }
        };
        if let Some(id) = existing {
            return id;
        }

        let id = TypeId(self.types.len() as u32);
        match &kind {
            TypeKind::Void => {
                self.voids.insert(is_const, id);
            }
            TypeKind::Bool => {
                self.bools.insert(is_const, id);
            }
            TypeKind::Integer { bits, signed } => {
                self.integers.insert((*bits, *signed, is_const), id);
            }
            TypeKind::Float(width) => {
                self.floats.insert((*width, is_const), id);
            }
            TypeKind::Pointer(pointee) => {
                self.pointers.insert((*pointee, is_const), id);
            }
            TypeKind::Array { element, dim } => {
                self.arrays.insert((*element, *dim, is_const), id);
            }
            TypeKind::Function { ret, params, variadic } => {
                self.functions
                    .insert((*ret, params.clone(), *variadic, is_const), id);
            }
            TypeKind::Struct(struct_id) => {
                self.struct_types.insert((*struct_id, is_const), id);
            }
            TypeKind::Alias { name, target } => {
                self.aliases.insert((name.clone(), *target), id);
            }
        }
        log::trace!("interned type #{} {:?} (const: {})", id.0, kind, is_const);
        self.types.push(TypeData { kind, is_const });
        id
    }

    // ---------------------------------------------------------------------
    // Factories
    // ---------------------------------------------------------------------

    pub fn void_type(&mut self) -> TypeId {
        self.intern(TypeKind::Void, false)
    }

    pub fn bool_type(&mut self) -> TypeId {
        self.intern(TypeKind::Bool, false)
    }

    pub fn integer(&mut self, bits: u16, signed: bool) -> TypeId {
        self.intern(TypeKind::Integer { bits, signed }, false)
    }

    pub fn signed(&mut self, bits: u16) -> TypeId {
        self.integer(bits, true)
    }

    pub fn unsigned(&mut self, bits: u16) -> TypeId {
        self.integer(bits, false)
    }

    /// The platform size type used for indexing
    pub fn size_type(&mut self) -> TypeId {
        self.integer(self.size_type_bits, false)
    }

    pub fn float(&mut self, width: FloatWidth) -> TypeId {
        self.intern(TypeKind::Float(width), false)
    }

    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.intern(TypeKind::Pointer(Some(pointee)), false)
    }

    /// The type of the `nullptr` literal
    pub fn null_pointer(&mut self) -> TypeId {
        self.intern(TypeKind::Pointer(None), false)
    }

    /// Array of `dim` elements; `dim == 0` is an unbound array
    pub fn array(&mut self, element: TypeId, dim: u64) -> TypeId {
        self.intern(TypeKind::Array { element, dim }, false)
    }

    pub fn function(&mut self, ret: TypeId, params: Vec<TypeId>, variadic: bool) -> TypeId {
        self.intern(TypeKind::Function { ret, params, variadic }, false)
    }

    /// Declare a new struct tag. Every call yields a fresh nominal identity.
    pub fn incomplete_struct(&mut self, name: &str) -> TypeId {
        let id = StructId(self.structs.len() as u32);
        self.structs.push(StructData {
            name: name.to_string(),
            members: None,
            removed: false,
        });
        log::debug!("declared struct {} with id {}", name, id.0);
        self.intern(TypeKind::Struct(id), false)
    }

    /// Attach members to a previously declared struct, exactly once
    pub fn complete_struct(
        &mut self,
        ty: TypeId,
        names: Vec<String>,
        types: Vec<TypeId>,
    ) -> Result<(), TypeError> {
        let id = self.struct_id(ty).ok_or_else(|| TypeError::NotAStruct {
            ty: self.name(ty),
        })?;
        let name = self.structs[id.0 as usize].name.clone();

        if self.structs[id.0 as usize].members.is_some() {
            return Err(TypeError::DuplicateCompletion { name });
        }
        if names.len() != types.len() {
            return Err(TypeError::MemberCountMismatch {
                name,
                names: names.len(),
                types: types.len(),
            });
        }

        let mut members: Vec<Member> = Vec::with_capacity(names.len());
        for (member, member_ty) in names.into_iter().zip(types) {
            if members.iter().any(|m| m.name == member) {
                return Err(TypeError::DuplicateMember { name, member });
            }
            if !self.has_size(member_ty) {
                return Err(TypeError::IncompleteMember { name, member });
            }
            members.push(Member { name: member, ty: member_ty });
        }

        self.structs[id.0 as usize].members = Some(members);
        Ok(())
    }

    /// Drop a scope-local struct tag. Its id is never handed out again and
    /// existing handles stay valid.
    pub fn remove_struct(&mut self, ty: TypeId) {
        if let Some(id) = self.struct_id(ty) {
            self.structs[id.0 as usize].removed = true;
            self.struct_types.remove(&(id, false));
            self.struct_types.remove(&(id, true));
            log::debug!("removed struct {} (id {})", self.structs[id.0 as usize].name, id.0);
        }
    }

    pub fn alias(&mut self, name: &str, target: TypeId) -> TypeId {
        self.intern(
            TypeKind::Alias {
                name: name.to_string(),
                target,
            },
            false,
        )
    }

    /// The const-qualified instance paired with `ty`
    pub fn get_const(&mut self, ty: TypeId) -> TypeId {
        self.with_const(ty, true)
    }

    /// The unqualified instance paired with `ty`
    pub fn get_const_removed(&mut self, ty: TypeId) -> TypeId {
        self.with_const(ty, false)
    }

    fn with_const(&mut self, ty: TypeId, is_const: bool) -> TypeId {
        let data = self.data(ty).clone();
        match data.kind {
            TypeKind::Alias { name, target } => {
                let target = self.with_const(target, is_const);
                self.alias(&name, target)
            }
            _ if data.is_const == is_const => ty,
            kind => self.intern(kind, is_const),
        }
    }

    /// Replace an unbound array type by one of dimension `dim`
    pub fn patch_unbound_array(&mut self, ty: TypeId, dim: u64) -> TypeId {
        if !self.is_unbound_array(ty) {
            return ty;
        }
        let is_const = self.is_const(ty);
        let element = match self.kind(ty) {
            TypeKind::Array { element, .. } => *element,
            _ => return ty,
        };
        let patched = self.array(element, dim);
        self.with_const(patched, is_const)
    }

    // ---------------------------------------------------------------------
    // Queries (every query resolves aliases first)
    // ---------------------------------------------------------------------

    /// Resolve any chain of aliases
    pub fn unalias(&self, mut ty: TypeId) -> TypeId {
        while let TypeKind::Alias { target, .. } = &self.data(ty).kind {
            ty = *target;
        }
        ty
    }

    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        &self.data(self.unalias(ty)).kind
    }

    pub fn is_alias(&self, ty: TypeId) -> bool {
        matches!(self.data(ty).kind, TypeKind::Alias { .. })
    }

    pub fn is_const(&self, ty: TypeId) -> bool {
        self.data(self.unalias(ty)).is_const
    }

    pub fn is_void(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Void)
    }

    pub fn is_bool(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Bool)
    }

    pub fn is_integer(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Integer { .. })
    }

    pub fn is_signed_integer(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Integer { signed: true, .. })
    }

    pub fn is_unsigned_integer(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Integer { signed: false, .. })
    }

    /// Width in bits of bool, integer and float types
    pub fn bits(&self, ty: TypeId) -> Option<u16> {
        match self.kind(ty) {
            TypeKind::Bool => Some(1),
            TypeKind::Integer { bits, .. } => Some(*bits),
            TypeKind::Float(width) => Some(width.bits()),
            _ => None,
        }
    }

    pub fn is_float(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Float(_))
    }

    /// Bool, integer or float
    pub fn is_arithmetic(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Bool | TypeKind::Integer { .. } | TypeKind::Float(_)
        )
    }

    /// Pointer types, including the null pointer type
    pub fn is_pointer(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Pointer(_))
    }

    pub fn is_nullptr(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Pointer(None))
    }

    pub fn is_array(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Array { .. })
    }

    pub fn is_unbound_array(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Array { dim: 0, .. })
    }

    pub fn is_function(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Function { .. })
    }

    pub fn is_struct(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Struct(_))
    }

    pub fn is_scalar(&self, ty: TypeId) -> bool {
        !self.is_array(ty) && !self.is_struct(ty)
    }

    /// Referenced type of a pointer or element type of an array.
    ///
    /// The null pointer type references nothing and yields `None`.
    pub fn ref_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Pointer(pointee) => *pointee,
            TypeKind::Array { element, .. } => Some(*element),
            _ => None,
        }
    }

    pub fn dim(&self, ty: TypeId) -> Option<u64> {
        match self.kind(ty) {
            TypeKind::Array { dim, .. } => Some(*dim),
            _ => None,
        }
    }

    pub fn ret_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Function { ret, .. } => Some(*ret),
            _ => None,
        }
    }

    pub fn param_types(&self, ty: TypeId) -> &[TypeId] {
        match self.kind(ty) {
            TypeKind::Function { params, .. } => params,
            _ => &[],
        }
    }

    pub fn has_varg(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Function { variadic: true, .. })
    }

    pub fn struct_id(&self, ty: TypeId) -> Option<StructId> {
        match self.kind(ty) {
            TypeKind::Struct(id) => Some(*id),
            _ => None,
        }
    }

    pub fn struct_name(&self, ty: TypeId) -> Option<&str> {
        self.struct_id(ty)
            .map(|id| self.structs[id.0 as usize].name.as_str())
    }

    pub fn is_complete(&self, ty: TypeId) -> bool {
        self.struct_id(ty)
            .is_some_and(|id| self.structs[id.0 as usize].members.is_some())
    }

    pub fn is_removed(&self, ty: TypeId) -> bool {
        self.struct_id(ty)
            .is_some_and(|id| self.structs[id.0 as usize].removed)
    }

    pub fn members(&self, ty: TypeId) -> Result<&[Member], TypeError> {
        let id = self.struct_id(ty).ok_or_else(|| TypeError::NotAStruct {
            ty: self.name(ty),
        })?;
        let data = &self.structs[id.0 as usize];
        data.members
            .as_deref()
            .ok_or_else(|| TypeError::IncompleteStruct { name: data.name.clone() })
    }

    pub fn member_index(&self, ty: TypeId, member: &str) -> Result<usize, TypeError> {
        let members = self.members(ty)?;
        members
            .iter()
            .position(|m| m.name == member)
            .ok_or_else(|| TypeError::UnknownMember {
                name: self.struct_name(ty).unwrap_or_default().to_string(),
                member: member.to_string(),
            })
    }

    pub fn member_type(&self, ty: TypeId, member: &str) -> Result<TypeId, TypeError> {
        let index = self.member_index(ty, member)?;
        Ok(self.members(ty)?[index].ty)
    }

    /// Whether objects of this type occupy storage
    pub fn has_size(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TypeKind::Void | TypeKind::Function { .. } => false,
            TypeKind::Array { element, dim } => *dim > 0 && self.has_size(*element),
            TypeKind::Struct(_) => self.is_complete(ty),
            _ => true,
        }
    }

    /// Semantic equality: aliases resolved, qualifiers compared, structs by id
    pub fn equals(&self, a: TypeId, b: TypeId) -> bool {
        let (a, b) = (self.unalias(a), self.unalias(b));
        if a == b {
            return true;
        }
        let (da, db) = (self.data(a), self.data(b));
        if da.is_const != db.is_const {
            return false;
        }
        match (&da.kind, &db.kind) {
            (TypeKind::Pointer(Some(x)), TypeKind::Pointer(Some(y))) => self.equals(*x, *y),
            (
                TypeKind::Array { element: x, dim: n },
                TypeKind::Array { element: y, dim: m },
            ) => n == m && self.equals(*x, *y),
            (
                TypeKind::Function { ret: r1, params: p1, variadic: v1 },
                TypeKind::Function { ret: r2, params: p2, variadic: v2 },
            ) => {
                v1 == v2
                    && self.equals(*r1, *r2)
                    && p1.len() == p2.len()
                    && p1.iter().zip(p2).all(|(x, y)| self.equals(*x, *y))
            }
            (TypeKind::Struct(x), TypeKind::Struct(y)) => x == y,
            // Leaf shapes are interned: distinct ids mean distinct shapes
            _ => false,
        }
    }

    /// Equality ignoring the top-level const qualifier
    pub fn equals_unqualified(&mut self, a: TypeId, b: TypeId) -> bool {
        let a = self.get_const_removed(a);
        let b = self.get_const_removed(b);
        self.equals(a, b)
    }

    /// Name of an alias type (not resolved)
    pub fn alias_name(&self, ty: TypeId) -> Option<&str> {
        match &self.data(ty).kind {
            TypeKind::Alias { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Displayable form of a type
    pub fn display(&self, ty: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { table: self, ty }
    }

    pub fn name(&self, ty: TypeId) -> String {
        self.display(ty).to_string()
    }

    fn fmt_type(&self, ty: TypeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data(ty);
        let prefix = if data.is_const { "const " } else { "" };
        match &data.kind {
            TypeKind::Alias { name, target } => {
                if self.is_const(*target) {
                    write!(f, "const ")?;
                }
                write!(f, "{name}")
            }
            TypeKind::Void => write!(f, "{prefix}void"),
            TypeKind::Bool => write!(f, "{prefix}bool"),
            TypeKind::Integer { bits, signed } => {
                write!(f, "{prefix}{}{bits}", if *signed { "i" } else { "u" })
            }
            TypeKind::Float(width) => write!(f, "{prefix}f{}", width.bits()),
            TypeKind::Pointer(None) => write!(f, "{prefix}nullptr_t"),
            TypeKind::Pointer(Some(pointee)) => {
                self.fmt_type(*pointee, f)?;
                write!(f, "*")?;
                if data.is_const {
                    write!(f, " const")?;
                }
                Ok(())
            }
            TypeKind::Array { element, dim } => {
                write!(f, "{prefix}")?;
                self.fmt_type(*element, f)?;
                if *dim == 0 {
                    write!(f, "[]")
                } else {
                    write!(f, "[{dim}]")
                }
            }
            TypeKind::Function { ret, params, variadic } => {
                write!(f, "{prefix}fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.fmt_type(*param, f)?;
                }
                if *variadic {
                    if !params.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "...")?;
                }
                write!(f, "): ")?;
                self.fmt_type(*ret, f)
            }
            TypeKind::Struct(id) => {
                write!(f, "{prefix}struct {}", self.structs[id.0 as usize].name)
            }
        }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper returned by [`TypeTable::display`]
pub struct TypeDisplay<'a> {
    table: &'a TypeTable,
    ty: TypeId,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.table.fmt_type(self.ty, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_interning() {
        let mut types = TypeTable::new();
        let a = types.integer(32, true);
        let b = types.integer(32, true);
        let c = types.integer(32, false);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(types.equals(a, b));
        assert!(!types.equals(a, c));
    }

    #[test]
    fn test_const_pairing_is_inverse() {
        let mut types = TypeTable::new();
        let i32_ty = types.signed(32);
        let const_i32 = types.get_const(i32_ty);
        assert_ne!(i32_ty, const_i32);
        assert_eq!(types.get_const(const_i32), const_i32);
        assert_eq!(types.get_const_removed(const_i32), i32_ty);
        assert_eq!(types.get_const_removed(i32_ty), i32_ty);
        assert!(!types.equals(i32_ty, const_i32));

        let ptr = types.pointer(const_i32);
        let const_ptr = types.get_const(ptr);
        assert_eq!(types.get_const_removed(const_ptr), ptr);
        assert_eq!(types.ref_type(const_ptr), Some(const_i32));
    }

    #[test]
    fn test_compound_interning() {
        let mut types = TypeTable::new();
        let u8_ty = types.unsigned(8);
        let p1 = types.pointer(u8_ty);
        let p2 = types.pointer(u8_ty);
        assert_eq!(p1, p2);

        let a1 = types.array(u8_ty, 4);
        let a2 = types.array(u8_ty, 4);
        let a3 = types.array(u8_ty, 5);
        assert_eq!(a1, a2);
        assert_ne!(a1, a3);

        let void = types.void_type();
        let f1 = types.function(void, vec![p1, u8_ty], false);
        let f2 = types.function(void, vec![p1, u8_ty], false);
        let f3 = types.function(void, vec![p1, u8_ty], true);
        assert_eq!(f1, f2);
        assert_ne!(f1, f3);
        assert_eq!(types.param_types(f1), &[p1, u8_ty]);
    }

    #[test]
    fn test_struct_identity_is_nominal() {
        let mut types = TypeTable::new();
        let i32_ty = types.signed(32);
        let a = types.incomplete_struct("A");
        let b = types.incomplete_struct("B");
        types
            .complete_struct(a, vec!["x".into()], vec![i32_ty])
            .unwrap();
        types
            .complete_struct(b, vec!["x".into()], vec![i32_ty])
            .unwrap();
        assert!(!types.equals(a, b));
        assert!(types.equals(a, a));

        // Same name declared twice is still two identities
        let a2 = types.incomplete_struct("A");
        assert!(!types.equals(a, a2));
    }

    #[test]
    fn test_self_referential_struct() {
        let mut types = TypeTable::new();
        let node = types.incomplete_struct("Node");
        let next = types.pointer(node);
        let i64_ty = types.signed(64);
        types
            .complete_struct(node, vec!["value".into(), "next".into()], vec![i64_ty, next])
            .unwrap();
        assert_eq!(types.member_type(node, "next"), Ok(next));
        assert_eq!(types.member_index(node, "value"), Ok(0));
    }

    #[test]
    fn test_struct_completion_errors() {
        let mut types = TypeTable::new();
        let i32_ty = types.signed(32);
        let s = types.incomplete_struct("S");
        assert_eq!(
            types.member_type(s, "x"),
            Err(TypeError::IncompleteStruct { name: "S".into() })
        );
        types.complete_struct(s, vec!["x".into()], vec![i32_ty]).unwrap();
        assert_eq!(
            types.complete_struct(s, vec!["y".into()], vec![i32_ty]),
            Err(TypeError::DuplicateCompletion { name: "S".into() })
        );
        assert_eq!(
            types.member_type(s, "y"),
            Err(TypeError::UnknownMember { name: "S".into(), member: "y".into() })
        );

        let t = types.incomplete_struct("T");
        assert!(matches!(
            types.complete_struct(t, vec!["a".into(), "a".into()], vec![i32_ty, i32_ty]),
            Err(TypeError::DuplicateMember { .. })
        ));
        assert!(matches!(
            types.complete_struct(t, vec!["me".into()], vec![t]),
            Err(TypeError::IncompleteMember { .. })
        ));
    }

    #[test]
    fn test_removed_struct_keeps_handle() {
        let mut types = TypeTable::new();
        let s = types.incomplete_struct("Local");
        types.remove_struct(s);
        assert!(types.is_removed(s));
        assert_eq!(types.struct_name(s), Some("Local"));
        let again = types.incomplete_struct("Local");
        assert_ne!(types.struct_id(s), types.struct_id(again));
    }

    #[test]
    fn test_alias_is_transparent() {
        let mut types = TypeTable::new();
        let u64_ty = types.unsigned(64);
        let size_t = types.alias("size_t", u64_ty);
        assert_ne!(size_t, u64_ty);
        assert!(types.equals(size_t, u64_ty));
        assert!(types.is_unsigned_integer(size_t));
        assert_eq!(types.bits(size_t), Some(64));
        assert_eq!(types.name(size_t), "size_t");

        let const_size_t = types.get_const(size_t);
        assert!(types.is_const(const_size_t));
        assert_eq!(types.alias_name(const_size_t), Some("size_t"));
        assert_eq!(types.name(const_size_t), "const size_t");

        let p1 = types.pointer(size_t);
        let p2 = types.pointer(u64_ty);
        assert!(types.equals(p1, p2));
    }

    #[test]
    fn test_display() {
        let mut types = TypeTable::new();
        let u8_ty = types.unsigned(8);
        let const_u8 = types.get_const(u8_ty);
        let ptr = types.pointer(const_u8);
        assert_eq!(types.name(ptr), "const u8*");
        let const_ptr = types.get_const(ptr);
        assert_eq!(types.name(const_ptr), "const u8* const");

        let i32_ty = types.signed(32);
        let arr = types.array(i32_ty, 4);
        assert_eq!(types.name(arr), "i32[4]");
        let unbound = types.array(i32_ty, 0);
        assert_eq!(types.name(unbound), "i32[]");

        let f = types.function(i32_ty, vec![ptr], true);
        assert_eq!(types.name(f), "fn(const u8*, ...): i32");

        let null = types.null_pointer();
        assert_eq!(types.name(null), "nullptr_t");
        let f64_ty = types.float(FloatWidth::F64);
        assert_eq!(types.name(f64_ty), "f64");
    }

    #[test]
    fn test_null_pointer_has_no_ref_type() {
        let mut types = TypeTable::new();
        let null = types.null_pointer();
        assert!(types.is_pointer(null));
        assert!(types.is_nullptr(null));
        assert_eq!(types.ref_type(null), None);
    }

    #[test]
    fn test_patch_unbound_array() {
        let mut types = TypeTable::new();
        let i32_ty = types.signed(32);
        let unbound = types.array(i32_ty, 0);
        let const_unbound = types.get_const(unbound);
        let patched = types.patch_unbound_array(const_unbound, 3);
        assert_eq!(types.dim(patched), Some(3));
        assert!(types.is_const(patched));
        assert!(types.has_size(patched));
        assert!(!types.has_size(unbound));
    }
}
