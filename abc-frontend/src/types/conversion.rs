//! Implicit conversion, explicit casts and the common type of two operands

use super::{TypeId, TypeKind, TypeTable};

/// Outcome of a permitted conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    /// Type of the converted value. Equal to the requested destination,
    /// except for an unbound array destination, whose dimension is taken
    /// from the source.
    pub target: TypeId,
    /// A const pointee or element was converted to a non-const one.
    /// The conversion proceeds; callers report a warning.
    pub discards_const: bool,
}

impl TypeTable {
    /// Bool and integers share the integral conversions
    fn is_integral(&self, ty: TypeId) -> bool {
        self.is_bool(ty) || self.is_integer(ty)
    }

    /// Implicit conversion from `from` to `to`
    pub fn implicit_convert(&mut self, from: TypeId, to: TypeId) -> Option<Conversion> {
        self.convert(from, to, false)
    }

    /// Explicit cast: const may be removed and any pointer becomes any
    /// other pointer
    pub fn explicit_cast(&mut self, from: TypeId, to: TypeId) -> Option<Conversion> {
        let plain_from = self.get_const_removed(from);
        let plain_to = self.get_const_removed(to);
        if let Some(conversion) = self.convert(plain_from, plain_to, false) {
            let target = if self.is_unbound_array(to) {
                conversion.target
            } else {
                to
            };
            return Some(Conversion { target, ..conversion });
        }

        if self.is_pointer(from) && self.is_pointer(to) && !self.is_nullptr(to) {
            let discards_const = match (self.ref_type(from), self.ref_type(to)) {
                (Some(f), Some(t)) => self.is_const(f) && !self.is_const(t),
                _ => false,
            };
            return Some(Conversion { target: to, discards_const });
        }
        None
    }

    /// `nested` is set while comparing pointees or elements, where the
    /// const qualifier of the source must be preserved. Losing it is
    /// reported through `discards_const` and the conversion still succeeds;
    /// callers turn it into a warning, not a rejection.
    fn convert(&mut self, from: TypeId, to: TypeId, nested: bool) -> Option<Conversion> {
        let mut discards_const = nested && self.is_const(from) && !self.is_const(to);
        let plain_from = self.get_const_removed(self.unalias(from));
        let plain_to = self.get_const_removed(self.unalias(to));

        if self.equals(plain_from, plain_to) {
            return Some(Conversion { target: to, discards_const });
        }

        let mut target = to;
        let permitted = match self.kind(plain_to).clone() {
            TypeKind::Bool => self.is_integral(plain_from) || self.is_pointer(plain_from),
            TypeKind::Float(_) => self.is_integral(plain_from) || self.is_float(plain_from),
            TypeKind::Integer { .. } => self.is_integral(plain_from) || self.is_float(plain_from),
            TypeKind::Pointer(None) => false,
            TypeKind::Pointer(Some(to_ref)) => match self.kind(plain_from).clone() {
                TypeKind::Pointer(None) => true,
                TypeKind::Array { element, .. } => {
                    self.pointee_compatible(element, to_ref, &mut discards_const)
                }
                TypeKind::Pointer(Some(from_ref)) => {
                    if self.is_void(from_ref) || self.is_void(to_ref) {
                        discards_const |= self.is_const(from_ref) && !self.is_const(to_ref);
                        true
                    } else {
                        self.pointee_compatible(from_ref, to_ref, &mut discards_const)
                    }
                }
                _ => false,
            },
            TypeKind::Array { element: to_elem, dim: to_dim } => match self.kind(plain_from).clone() {
                TypeKind::Array { element: from_elem, dim: from_dim } => {
                    if to_dim != from_dim && to_dim != 0 {
                        false
                    } else if let Some(inner) = self.convert(from_elem, to_elem, nested) {
                        discards_const |= inner.discards_const;
                        if to_dim == 0 {
                            target = self.patch_unbound_array(to, from_dim);
                        }
                        true
                    } else {
                        false
                    }
                }
                _ => false,
            },
            // Structs convert only to themselves, handled by `equals` above
            TypeKind::Struct(_) => false,
            TypeKind::Void | TypeKind::Function { .. } | TypeKind::Alias { .. } => false,
        };

        permitted.then_some(Conversion { target, discards_const })
    }

    /// Pointees must be equal apart from their own const qualifier
    fn pointee_compatible(&mut self, from: TypeId, to: TypeId, discards_const: &mut bool) -> bool {
        match self.convert(from, to, true) {
            Some(inner) => {
                *discards_const |= inner.discards_const;
                let plain_from = self.get_const_removed(from);
                let plain_to = self.get_const_removed(to);
                self.equals(plain_from, plain_to)
            }
            None => false,
        }
    }

    /// Common type of two operands, as used by the conditional operator
    /// and the usual arithmetic promotion
    pub fn common(&mut self, a: TypeId, b: TypeId) -> Option<TypeId> {
        let (mut a, mut b) = (a, b);
        if self.is_integral(a) && self.is_float(b) {
            std::mem::swap(&mut a, &mut b);
        }
        let plain_a = self.get_const_removed(a);
        let plain_b = self.get_const_removed(b);

        if self.equals(plain_a, plain_b) {
            return Some(plain_a);
        }
        if self.is_array(a) && self.is_array(b) {
            let elem_a = self.ref_type(a)?;
            let elem_b = self.ref_type(b)?;
            return self.equals(elem_a, elem_b).then(|| self.pointer(elem_a));
        }
        if self.is_float(a) && self.is_integral(b) {
            return Some(plain_a);
        }
        if self.is_float(a) && self.is_float(b) {
            let wider = if self.bits(a) >= self.bits(b) { plain_a } else { plain_b };
            return Some(wider);
        }
        if self.is_integral(a) && self.is_integral(b) {
            if self.is_bool(a) && self.is_bool(b) {
                return Some(self.bool_type());
            }
            let bits = self.bits(a).unwrap_or(1).max(self.bits(b).unwrap_or(1));
            let unsigned = self.is_unsigned_integer(a) || self.is_unsigned_integer(b);
            return Some(self.integer(bits, !unsigned));
        }
        if self.is_pointer(a) && self.is_nullptr(b) {
            return Some(plain_a);
        }
        if self.is_nullptr(a) && self.is_pointer(b) {
            return Some(plain_b);
        }
        None
    }
}
