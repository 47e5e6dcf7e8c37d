//! Human-readable rendering of type trees for diagnostics.

use latis_ir::keys;

use crate::stack::ensure_sufficient_stack;
use crate::{ClassHierarchy, NodeId, PrimitiveType, TypeFlags, TypeTree};

impl TypeTree {
    /// Render the subtree at `id`, e.g. `array<int|false>` or
    /// `shape(id: int, name: string)`.
    pub fn render(&self, id: NodeId, classes: &dyn ClassHierarchy) -> String {
        let mut out = String::new();
        self.render_into(&mut out, id, classes);
        out
    }

    fn render_into(&self, out: &mut String, id: NodeId, classes: &dyn ClassHierarchy) {
        ensure_sufficient_stack(|| {
            let kind = self.real_ptype(id);
            match kind {
                PrimitiveType::Array => self.render_array(out, id, classes),
                PrimitiveType::Tuple => {
                    out.push_str("tuple(");
                    for (i, &(_, child)) in self.children(id).iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.render_into(out, child, classes);
                    }
                    out.push(')');
                }
                PrimitiveType::Shape => {
                    out.push_str("shape(");
                    self.render_fields(out, id, classes);
                    out.push(')');
                }
                PrimitiveType::Class => match self.class(id) {
                    Some(class) => out.push_str(&classes.class_name(class)),
                    None => out.push_str(kind.name()),
                },
                _ => out.push_str(kind.name()),
            }

            if self.flags(id).contains(TypeFlags::NULLABLE) && kind != PrimitiveType::False {
                out.push_str("|false");
            }
        });
    }

    fn render_array(&self, out: &mut String, id: NodeId, classes: &dyn ClassHierarchy) {
        let elem = self.any_key_child(id).unwrap_or(NodeId::UNKNOWN);
        if self.children(id).is_empty() {
            out.push_str("array<");
            self.render_into(out, elem, classes);
            out.push('>');
            return;
        }

        out.push_str("array{");
        self.render_fields(out, id, classes);
        if !elem.is_unknown() {
            out.push_str(", *: ");
            self.render_into(out, elem, classes);
        }
        out.push('}');
    }

    /// `k: T` for every explicit child, comma separated.
    fn render_fields(&self, out: &mut String, id: NodeId, classes: &dyn ClassHierarchy) {
        for (i, &(key, child)) in self.children(id).iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&keys().render(key));
            out.push_str(": ");
            self.render_into(out, child, classes);
        }
    }
}
