//! Transfer resolution: which cleanup actions a generated wrapper performs.
//!
//! Two pure functions mirror the two execution paths of a generated wrapper:
//! [`cleanup_on_success`] for the ordinary return and [`cleanup_on_failure`]
//! for the branch where the native call raised. Both share one free-primitive
//! lookup keyed by [`Category`]. They diverge in exactly two places:
//!
//! - on failure, a container shell is freed even under `Transfer::Container`
//!   (the callee never took it — the call failed);
//! - on failure, `Transfer::Everything` values that are reference-counted
//!   are still released (ownership never actually passed), while
//!   `Everything`-transferred values with no reference count are left
//!   unhandled and flagged. There is no free primitive that is correct for
//!   them, so the gap stays visible in the output instead of being papered
//!   over.
//!
//! The success-path treatment of `Everything` is itself an approximation:
//! ownership is considered passed at the point of the call, not at the point
//! the callee stores the value.

use gir2hs_model::{classify, ApiIndex, Arg, Category, Transfer};

use crate::error::Result;

/// Concrete free primitives the generated code can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreePrimitive {
    /// Generic allocator free (`g_free`): strings and plain C arrays.
    FreeMem,
    /// Drop a reference to a reference-counted object.
    ObjectUnref,
    /// Free a boxed struct or union through its registered free function.
    BoxedFree,
    /// Release a growable-array container.
    GArrayUnref,
    /// Release a pointer-array container.
    PtrArrayUnref,
    /// Release a byte-buffer container.
    ByteArrayUnref,
    /// Free the links of a doubly linked list.
    ListFree,
    /// Free the links of a singly linked list.
    SListFree,
}

impl FreePrimitive {
    /// The runtime helper the emitter names for this primitive.
    pub fn helper(&self) -> &'static str {
        match self {
            FreePrimitive::FreeMem => "freeMem",
            FreePrimitive::ObjectUnref => "objectUnref",
            FreePrimitive::BoxedFree => "boxedFree",
            FreePrimitive::GArrayUnref => "unrefGArray",
            FreePrimitive::PtrArrayUnref => "unrefPtrArray",
            FreePrimitive::ByteArrayUnref => "unrefByteArray",
            FreePrimitive::ListFree => "freeGList",
            FreePrimitive::SListFree => "freeGSList",
        }
    }
}

/// Result of the free-primitive lookup for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeLookup {
    /// Free through this primitive.
    Prim(FreePrimitive),
    /// Nothing to free for values of this category.
    NotNeeded,
    /// A free would be needed but no primitive is known (plain structs and
    /// unions have bespoke free functions the metadata does not name).
    Unknown,
}

/// The free primitive for a value (or container shell) of this category.
pub fn free_primitive(cat: Category) -> FreeLookup {
    use FreeLookup::*;
    match cat {
        Category::String => Prim(FreePrimitive::FreeMem),
        Category::FixedArray | Category::LengthArray | Category::ZeroTerminatedArray => {
            Prim(FreePrimitive::FreeMem)
        }
        Category::GrowableArray => Prim(FreePrimitive::GArrayUnref),
        Category::PointerArray => Prim(FreePrimitive::PtrArrayUnref),
        Category::ByteArray => Prim(FreePrimitive::ByteArrayUnref),
        Category::List => Prim(FreePrimitive::ListFree),
        Category::SList => Prim(FreePrimitive::SListFree),
        Category::Object | Category::Interface => Prim(FreePrimitive::ObjectUnref),
        Category::Struct { boxed: true } | Category::Union { boxed: true } => {
            Prim(FreePrimitive::BoxedFree)
        }
        Category::Struct { boxed: false } | Category::Union { boxed: false } => Unknown,
        Category::Scalar | Category::Enum | Category::Callback | Category::HashTable
        | Category::Error => NotNeeded,
    }
}

/// The per-element mapping helper for a container category, when elements
/// can be freed individually.
pub fn map_function(cat: Category) -> Option<&'static str> {
    match cat {
        Category::FixedArray | Category::LengthArray => Some("mapCArray"),
        Category::ZeroTerminatedArray => Some("mapZeroTerminatedCArray"),
        Category::GrowableArray => Some("mapGArray"),
        Category::PointerArray => Some("mapPtrArray"),
        Category::List => Some("mapGList"),
        Category::SList => Some("mapGSList"),
        // Byte buffers hold no individually freed elements; hash-table
        // contents are outside the canonical cleanup set.
        Category::ByteArray | Category::HashTable => None,
        _ => None,
    }
}

/// Whether converting an input of this category allocates a transient
/// native copy owned by the wrapper. Objects, records, and scalars are
/// passed as-is; strings and containers are packed into fresh native
/// memory.
fn allocates_transient_copy(cat: Category) -> bool {
    cat == Category::String || cat.is_container()
}

/// One cleanup step the emitter renders after the native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupAction {
    /// Free each element of a container through its mapping helper.
    FreeElements {
        map_fn: &'static str,
        free: FreePrimitive,
    },
    /// Free the value itself (the container shell, the string buffer, or a
    /// reference being released).
    Free { free: FreePrimitive },
    /// Free the wrapper-allocated out-parameter buffer.
    FreeOutBuffer,
    /// No correct action is known; rendered as a diagnostic marker.
    Unsupported { detail: String },
}

/// Cleanup actions for one argument on the success path.
///
/// Element contents are always freed strictly before the container shell;
/// freeing the shell first would free memory still being iterated.
pub fn cleanup_on_success(arg: &Arg, index: &ApiIndex) -> Result<Vec<CleanupAction>> {
    if arg.direction.is_out() {
        return Ok(vec![CleanupAction::FreeOutBuffer]);
    }

    let cat = classify(&arg.ty, index)?;
    if !allocates_transient_copy(cat) {
        return Ok(Vec::new());
    }

    let mut actions = Vec::new();
    match arg.transfer {
        Transfer::Everything => {}
        Transfer::Container => {
            push_element_free(&mut actions, cat, arg, index)?;
        }
        Transfer::None => {
            push_element_free(&mut actions, cat, arg, index)?;
            if let FreeLookup::Prim(free) = free_primitive(cat) {
                actions.push(CleanupAction::Free { free });
            }
        }
    }
    Ok(actions)
}

/// Cleanup actions for one argument on the failure path.
///
/// Used only for callables that may raise, on the branch where the native
/// call did not succeed. See the module docs for the two divergences from
/// the success path.
pub fn cleanup_on_failure(arg: &Arg, index: &ApiIndex) -> Result<Vec<CleanupAction>> {
    if arg.direction.is_out() {
        return Ok(vec![CleanupAction::FreeOutBuffer]);
    }

    let cat = classify(&arg.ty, index)?;
    let mut actions = Vec::new();
    match arg.transfer {
        Transfer::None | Transfer::Container => {
            if !allocates_transient_copy(cat) {
                return Ok(actions);
            }
            push_element_free(&mut actions, cat, arg, index)?;
            // The callee never took the shell, whatever the annotation said.
            if let FreeLookup::Prim(free) = free_primitive(cat) {
                actions.push(CleanupAction::Free { free });
            }
        }
        Transfer::Everything => {
            if cat.is_container() {
                // Ownership of the shell is considered passed at the call;
                // only reference-counted elements are recovered.
                push_element_free_on_error(&mut actions, cat, arg, index)?;
            } else if cat.is_managed() {
                actions.push(CleanupAction::Free {
                    free: FreePrimitive::ObjectUnref,
                });
            } else if !matches!(free_primitive(cat), FreeLookup::NotNeeded) {
                actions.push(CleanupAction::Unsupported {
                    detail: format!(
                        "'{}': transfer everything of a non-reference-counted value \
                         is not recoverable after a failed call",
                        arg.name
                    ),
                });
            }
        }
    }
    Ok(actions)
}

/// Success-style element cleanup: free elements through the category's
/// ordinary free primitive.
fn push_element_free(
    actions: &mut Vec<CleanupAction>,
    cat: Category,
    arg: &Arg,
    index: &ApiIndex,
) -> Result<()> {
    let (Some(map_fn), Some(elem)) = (map_function(cat), arg.ty.element()) else {
        return Ok(());
    };
    let elem_cat = classify(elem, index)?;
    if let FreeLookup::Prim(free) = free_primitive(elem_cat) {
        actions.push(CleanupAction::FreeElements { map_fn, free });
    }
    Ok(())
}

/// Error-style element cleanup for `Transfer::Everything` containers:
/// reference-counted elements are released; anything else that would need a
/// free is flagged.
fn push_element_free_on_error(
    actions: &mut Vec<CleanupAction>,
    cat: Category,
    arg: &Arg,
    index: &ApiIndex,
) -> Result<()> {
    let (Some(map_fn), Some(elem)) = (map_function(cat), arg.ty.element()) else {
        return Ok(());
    };
    let elem_cat = classify(elem, index)?;
    if elem_cat.is_managed() {
        actions.push(CleanupAction::FreeElements {
            map_fn,
            free: FreePrimitive::ObjectUnref,
        });
    } else if !matches!(free_primitive(elem_cat), FreeLookup::NotNeeded) {
        actions.push(CleanupAction::Unsupported {
            detail: format!(
                "'{}': elements transferred with everything are not recoverable \
                 after a failed call",
                arg.name
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gir2hs_model::{Direction, NamedKind, ScalarKind, StringKind, TypeDesc};

    fn index() -> ApiIndex {
        let mut index = ApiIndex::new();
        index.register("Gtk", "Widget", NamedKind::Object).unwrap();
        index
            .register("Gdk", "Rectangle", NamedKind::Struct { boxed: true })
            .unwrap();
        index
            .register("Gdk", "KeymapKey", NamedKind::Struct { boxed: false })
            .unwrap();
        index
    }

    fn arg(ty: TypeDesc, direction: Direction, transfer: Transfer) -> Arg {
        Arg {
            name: "value".to_string(),
            ty,
            direction,
            transfer,
            nullable: false,
        }
    }

    fn utf8_ztarray() -> TypeDesc {
        TypeDesc::ZeroTerminatedArray {
            elem: Box::new(TypeDesc::String(StringKind::Utf8)),
        }
    }

    #[test]
    fn everything_in_frees_nothing_on_success() {
        let index = index();
        for ty in [
            TypeDesc::String(StringKind::Utf8),
            utf8_ztarray(),
            TypeDesc::Named {
                namespace: "Gtk".to_string(),
                name: "Widget".to_string(),
            },
        ] {
            let a = arg(ty, Direction::In, Transfer::Everything);
            assert!(cleanup_on_success(&a, &index).unwrap().is_empty());
        }
    }

    #[test]
    fn borrowed_string_array_frees_elements_then_shell() {
        // transfer none, zero-terminated array of strings: each string is
        // freed, then the array buffer.
        let index = index();
        let a = arg(utf8_ztarray(), Direction::In, Transfer::None);
        let actions = cleanup_on_success(&a, &index).unwrap();
        assert_eq!(
            actions,
            vec![
                CleanupAction::FreeElements {
                    map_fn: "mapZeroTerminatedCArray",
                    free: FreePrimitive::FreeMem,
                },
                CleanupAction::Free {
                    free: FreePrimitive::FreeMem
                },
            ]
        );
    }

    #[test]
    fn container_transfer_keeps_shell_on_success() {
        let index = index();
        let a = arg(utf8_ztarray(), Direction::In, Transfer::Container);
        let actions = cleanup_on_success(&a, &index).unwrap();
        assert_eq!(
            actions,
            vec![CleanupAction::FreeElements {
                map_fn: "mapZeroTerminatedCArray",
                free: FreePrimitive::FreeMem,
            }]
        );
    }

    #[test]
    fn container_transfer_frees_shell_on_failure() {
        let index = index();
        let a = arg(utf8_ztarray(), Direction::In, Transfer::Container);
        let actions = cleanup_on_failure(&a, &index).unwrap();
        assert_eq!(
            actions,
            vec![
                CleanupAction::FreeElements {
                    map_fn: "mapZeroTerminatedCArray",
                    free: FreePrimitive::FreeMem,
                },
                CleanupAction::Free {
                    free: FreePrimitive::FreeMem
                },
            ]
        );
    }

    #[test]
    fn borrowed_scalar_needs_no_cleanup() {
        let index = index();
        let a = arg(
            TypeDesc::Scalar(ScalarKind::Int32),
            Direction::In,
            Transfer::None,
        );
        assert!(cleanup_on_success(&a, &index).unwrap().is_empty());
        assert!(cleanup_on_failure(&a, &index).unwrap().is_empty());
    }

    #[test]
    fn out_buffer_freed_on_both_paths() {
        let index = index();
        for direction in [Direction::Out, Direction::InOut] {
            let a = arg(
                TypeDesc::Scalar(ScalarKind::UInt64),
                direction,
                Transfer::Everything,
            );
            assert_eq!(
                cleanup_on_success(&a, &index).unwrap(),
                vec![CleanupAction::FreeOutBuffer]
            );
            assert_eq!(
                cleanup_on_failure(&a, &index).unwrap(),
                vec![CleanupAction::FreeOutBuffer]
            );
        }
    }

    #[test]
    fn everything_object_released_on_failure() {
        let index = index();
        let a = arg(
            TypeDesc::Named {
                namespace: "Gtk".to_string(),
                name: "Widget".to_string(),
            },
            Direction::In,
            Transfer::Everything,
        );
        assert_eq!(
            cleanup_on_failure(&a, &index).unwrap(),
            vec![CleanupAction::Free {
                free: FreePrimitive::ObjectUnref
            }]
        );
    }

    #[test]
    fn everything_string_flagged_on_failure() {
        let index = index();
        let a = arg(
            TypeDesc::String(StringKind::Utf8),
            Direction::In,
            Transfer::Everything,
        );
        let actions = cleanup_on_failure(&a, &index).unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], CleanupAction::Unsupported { .. }));
    }

    #[test]
    fn everything_object_array_releases_elements_on_failure() {
        let index = index();
        let a = arg(
            TypeDesc::ZeroTerminatedArray {
                elem: Box::new(TypeDesc::Named {
                    namespace: "Gtk".to_string(),
                    name: "Widget".to_string(),
                }),
            },
            Direction::In,
            Transfer::Everything,
        );
        let actions = cleanup_on_failure(&a, &index).unwrap();
        // Elements are recovered; the shell is considered handed over.
        assert_eq!(
            actions,
            vec![CleanupAction::FreeElements {
                map_fn: "mapZeroTerminatedCArray",
                free: FreePrimitive::ObjectUnref,
            }]
        );
    }

    #[test]
    fn everything_string_array_flagged_on_failure() {
        let index = index();
        let a = arg(utf8_ztarray(), Direction::In, Transfer::Everything);
        let actions = cleanup_on_failure(&a, &index).unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], CleanupAction::Unsupported { .. }));
    }

    #[test]
    fn plain_struct_has_no_known_primitive() {
        assert_eq!(
            free_primitive(Category::Struct { boxed: false }),
            FreeLookup::Unknown
        );
        assert_eq!(
            free_primitive(Category::Struct { boxed: true }),
            FreeLookup::Prim(FreePrimitive::BoxedFree)
        );
    }

    #[test]
    fn plain_struct_everything_flagged_on_failure() {
        let index = index();
        let a = arg(
            TypeDesc::Named {
                namespace: "Gdk".to_string(),
                name: "KeymapKey".to_string(),
            },
            Direction::In,
            Transfer::Everything,
        );
        let actions = cleanup_on_failure(&a, &index).unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], CleanupAction::Unsupported { .. }));
    }

    #[test]
    fn list_shell_primitives() {
        assert_eq!(
            free_primitive(Category::List),
            FreeLookup::Prim(FreePrimitive::ListFree)
        );
        assert_eq!(
            free_primitive(Category::SList),
            FreeLookup::Prim(FreePrimitive::SListFree)
        );
        assert_eq!(free_primitive(Category::HashTable), FreeLookup::NotNeeded);
        assert_eq!(free_primitive(Category::Scalar), FreeLookup::NotNeeded);
        assert_eq!(free_primitive(Category::Error), FreeLookup::NotNeeded);
    }
}
