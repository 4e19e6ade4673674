//! Human-readable rendering of types for diagnostics and traces.
//!
//! Unions and intersections are flattened for display: `Integer | String`,
//! `Comparable & Enumerable`. Applied types render as `List[Dog]`, tuples as
//! `[Integer, String]`, shapes as `{:a => Integer}` and metas as
//! `<Type: Dog>`.

use crate::intern::TypeInterner;
use crate::registry::ClassRegistry;
use crate::types::{ClassId, LiteralValue, TypeData, TypeId};

pub struct TypeFormatter<'a, R: ClassRegistry + ?Sized> {
    interner: &'a TypeInterner,
    registry: &'a R,
}

impl<'a, R: ClassRegistry + ?Sized> TypeFormatter<'a, R> {
    pub fn new(interner: &'a TypeInterner, registry: &'a R) -> Self {
        TypeFormatter { interner, registry }
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write(ty, &mut out);
        out
    }

    fn write(&self, ty: TypeId, out: &mut String) {
        let Some(data) = self.interner.lookup(ty) else {
            out.push_str(&format!("<dangling #{}>", ty.0));
            return;
        };
        match data {
            TypeData::Class(class) => out.push_str(&self.class_name(class)),
            TypeData::Union(..) => {
                let mut parts = Vec::new();
                self.flatten(ty, true, &mut parts);
                self.write_joined(&parts, " | ", true, out);
            }
            TypeData::Intersection(..) => {
                let mut parts = Vec::new();
                self.flatten(ty, false, &mut parts);
                self.write_joined(&parts, " & ", true, out);
            }
            TypeData::Applied(class, args) => {
                out.push_str(&self.class_name(class));
                out.push('[');
                self.write_joined(&self.interner.type_list(args), ", ", false, out);
                out.push(']');
            }
            TypeData::Tuple { elements, .. } => {
                out.push('[');
                self.write_joined(&self.interner.type_list(elements), ", ", false, out);
                out.push(']');
            }
            TypeData::Shape { keys, values } => {
                let keys = self.interner.type_list(keys);
                let values = self.interner.type_list(values);
                out.push('{');
                for (i, (&key, &value)) in keys.iter().zip(values.iter()).enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write(key, out);
                    out.push_str(" => ");
                    self.write(value, out);
                }
                out.push('}');
            }
            TypeData::Literal(value) => self.write_literal(value, out),
            TypeData::Meta(wrapped) => {
                out.push_str("<Type: ");
                self.write(wrapped, out);
                out.push('>');
            }
            TypeData::TypeVar(var) => out.push_str(&format!("T{}", var.0)),
            TypeData::LambdaParam { decl, lower, upper } => {
                out.push_str(&format!("<param #{} ", decl.0));
                self.write(lower, out);
                out.push_str("..");
                self.write(upper, out);
                out.push('>');
            }
            TypeData::SelfTypeParam(decl) => out.push_str(&format!("<self param #{}>", decl.0)),
            TypeData::SelfType => out.push_str("<self type>"),
            TypeData::Alias(decl) => out.push_str(&format!("<alias #{}>", decl.0)),
        }
    }

    fn write_literal(&self, value: LiteralValue, out: &mut String) {
        match value {
            LiteralValue::Integer(v) => out.push_str(&v.to_string()),
            LiteralValue::Float(v) => out.push_str(&format!("{:?}", v.0)),
            LiteralValue::String(atom) => {
                out.push_str(&format!("{:?}", &*self.interner.resolve_atom(atom)))
            }
            LiteralValue::Symbol(atom) => {
                out.push(':');
                out.push_str(&self.interner.resolve_atom(atom));
            }
            LiteralValue::True => out.push_str("true"),
            LiteralValue::False => out.push_str("false"),
        }
    }

    fn class_name(&self, class: ClassId) -> String {
        match class {
            ClassId::TOP => "top".to_string(),
            ClassId::BOTTOM => "bottom".to_string(),
            ClassId::UNTYPED => "untyped".to_string(),
            _ => self
                .registry
                .class_name(class)
                .map(str::to_string)
                .unwrap_or_else(|| format!("<class #{}>", class.0)),
        }
    }

    fn flatten(&self, ty: TypeId, union: bool, parts: &mut Vec<TypeId>) {
        match self.interner.lookup(ty) {
            Some(TypeData::Union(left, right)) if union => {
                self.flatten(left, union, parts);
                self.flatten(right, union, parts);
            }
            Some(TypeData::Intersection(left, right)) if !union => {
                self.flatten(left, union, parts);
                self.flatten(right, union, parts);
            }
            _ => parts.push(ty),
        }
    }

    /// Nested composites are parenthesized when `wrap_composites` is set.
    fn write_joined(&self, parts: &[TypeId], sep: &str, wrap_composites: bool, out: &mut String) {
        for (i, &part) in parts.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            let composite = matches!(
                self.interner.lookup(part),
                Some(TypeData::Union(..) | TypeData::Intersection(..))
            );
            if wrap_composites && composite {
                out.push('(');
                self.write(part, out);
                out.push(')');
            } else {
                self.write(part, out);
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
