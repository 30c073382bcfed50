//! Variant registration for benchmark cases.
//!
//! Each case assembles its own variant table with a [`VariantRegistry`]
//! builder and freezes it with [`VariantRegistry::finish`]. There is no
//! global table: a case that extends another copies the parent's finished
//! table explicitly with [`VariantRegistry::inherit`] or
//! [`VariantRegistry::inherit_via`].

use crate::error::BoxError;
use std::fmt;
use std::sync::Arc;

/// In-process workload. Timed by the runner, output discarded.
pub type InProcessFn<C> = Arc<dyn Fn(&mut C) -> Result<(), BoxError> + Send + Sync>;

/// Arguments passed to a native executable for one case instance.
pub type ArgsFn<C> = Arc<dyn Fn(&C) -> Vec<String> + Send + Sync>;

/// How a variant is executed.
pub enum Variant<C> {
    /// Called directly on the case instance.
    InProcess(InProcessFn<C>),
    /// A native executable built from `target`, reporting its own elapsed
    /// nanoseconds on stdout.
    External { target: String, args: ArgsFn<C> },
}

impl<C> Variant<C> {
    pub fn is_external(&self) -> bool {
        matches!(self, Variant::External { .. })
    }

    /// Build target of an external variant.
    pub fn target(&self) -> Option<&str> {
        match self {
            Variant::External { target, .. } => Some(target),
            Variant::InProcess(_) => None,
        }
    }
}

impl<C> Clone for Variant<C> {
    fn clone(&self) -> Self {
        match self {
            Variant::InProcess(f) => Variant::InProcess(Arc::clone(f)),
            Variant::External { target, args } => Variant::External {
                target: target.clone(),
                args: Arc::clone(args),
            },
        }
    }
}

impl<C> fmt::Debug for Variant<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::InProcess(_) => f.write_str("InProcess"),
            Variant::External { target, .. } => {
                f.debug_struct("External").field("target", target).finish()
            }
        }
    }
}

/// A labelled variant.
pub struct VariantEntry<C> {
    pub label: String,
    pub variant: Variant<C>,
}

impl<C> Clone for VariantEntry<C> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            variant: self.variant.clone(),
        }
    }
}

impl<C> fmt::Debug for VariantEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantEntry")
            .field("label", &self.label)
            .field("variant", &self.variant)
            .finish()
    }
}

/// Builder collecting the variants of one case, in registration order.
pub struct VariantRegistry<C> {
    entries: Vec<VariantEntry<C>>,
}

impl<C: 'static> VariantRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a variant. A label that is already present is replaced in
    /// place, keeping its original position.
    pub fn register_variant(&mut self, label: impl Into<String>, variant: Variant<C>) {
        let label = label.into();
        match self.entries.iter_mut().find(|e| e.label == label) {
            Some(entry) => entry.variant = variant,
            None => self.entries.push(VariantEntry { label, variant }),
        }
    }

    /// Register an in-process variant.
    pub fn in_process<F>(mut self, label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register_variant(label, Variant::InProcess(Arc::new(f)));
        self
    }

    /// Register an external variant running the executable built from `target`.
    pub fn external<A>(mut self, label: impl Into<String>, target: impl Into<String>, args: A) -> Self
    where
        A: Fn(&C) -> Vec<String> + Send + Sync + 'static,
    {
        self.register_variant(
            label,
            Variant::External {
                target: target.into(),
                args: Arc::new(args),
            },
        );
        self
    }

    /// Copy every variant of a parent case with the same fixture type.
    /// Variants registered afterwards under the same label win.
    pub fn inherit(mut self, parent: &VariantTable<C>) -> Self {
        for entry in parent.iter() {
            self.register_variant(entry.label.clone(), entry.variant.clone());
        }
        self
    }

    /// Copy every variant of a parent case whose fixture is embedded in this
    /// case's fixture.
    pub fn inherit_via<P>(mut self, parent: &VariantTable<P>) -> Self
    where
        P: 'static,
        C: AsRef<P> + AsMut<P>,
    {
        for entry in parent.iter() {
            let lifted = match &entry.variant {
                Variant::InProcess(f) => {
                    let f = Arc::clone(f);
                    Variant::InProcess(Arc::new(move |case: &mut C| f(case.as_mut())) as InProcessFn<C>)
                }
                Variant::External { target, args } => {
                    let args = Arc::clone(args);
                    Variant::External {
                        target: target.clone(),
                        args: Arc::new(move |case: &C| args(case.as_ref())) as ArgsFn<C>,
                    }
                }
            };
            self.register_variant(entry.label.clone(), lifted);
        }
        self
    }

    /// Freeze the registrations into the case's private table.
    pub fn finish(self) -> VariantTable<C> {
        VariantTable {
            entries: self.entries,
        }
    }
}

impl<C: 'static> Default for VariantRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable variant table owned by one case.
pub struct VariantTable<C> {
    entries: Vec<VariantEntry<C>>,
}

impl<C> VariantTable<C> {
    /// Variants in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &VariantEntry<C>> {
        self.entries.iter()
    }

    pub fn get(&self, label: &str) -> Option<&Variant<C>> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.variant)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Clone for VariantTable<C> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<C> fmt::Debug for VariantTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Buffer(Vec<u32>);

    struct Wrapped {
        base: Buffer,
        extra: u32,
    }

    impl AsRef<Buffer> for Wrapped {
        fn as_ref(&self) -> &Buffer {
            &self.base
        }
    }

    impl AsMut<Buffer> for Wrapped {
        fn as_mut(&mut self) -> &mut Buffer {
            &mut self.base
        }
    }

    fn push(value: u32) -> impl Fn(&mut Buffer) -> Result<(), BoxError> + Send + Sync {
        move |b: &mut Buffer| {
            b.0.push(value);
            Ok(())
        }
    }

    fn run(table: &VariantTable<Buffer>, label: &str, buffer: &mut Buffer) {
        match table.get(label) {
            Some(Variant::InProcess(f)) => f(buffer).unwrap(),
            other => panic!("expected in-process variant, got {:?}", other),
        }
    }

    #[test]
    fn test_registration_order() {
        let table = VariantRegistry::new()
            .in_process("b", push(1))
            .in_process("a", push(2))
            .external("native", "mul_f32", |b: &Buffer| vec![b.0.len().to_string()])
            .finish();

        assert_eq!(table.labels(), vec!["b", "a", "native"]);
        assert_eq!(table.get("native").and_then(|v| v.target()), Some("mul_f32"));
    }

    #[test]
    fn test_duplicate_label_overwrites_in_place() {
        let table = VariantRegistry::new()
            .in_process("x", push(1))
            .in_process("y", push(2))
            .in_process("x", push(3))
            .finish();

        assert_eq!(table.labels(), vec!["x", "y"]);
        let mut buffer = Buffer(Vec::new());
        run(&table, "x", &mut buffer);
        assert_eq!(buffer.0, vec![3]);
    }

    #[test]
    fn test_inherit_and_override() {
        let base = VariantRegistry::new().in_process("X", push(1)).finish();

        let child = VariantRegistry::new()
            .inherit(&base)
            .in_process("Y", push(2))
            .finish();
        assert_eq!(child.labels(), vec!["X", "Y"]);

        let overriding = VariantRegistry::new()
            .inherit(&base)
            .in_process("X", push(9))
            .finish();
        assert_eq!(overriding.labels(), vec!["X"]);

        let mut buffer = Buffer(Vec::new());
        run(&overriding, "X", &mut buffer);
        assert_eq!(buffer.0, vec![9]);

        // The parent's table is untouched
        let mut buffer = Buffer(Vec::new());
        run(&base, "X", &mut buffer);
        assert_eq!(buffer.0, vec![1]);
    }

    #[test]
    fn test_inherit_via_projection() {
        let base = VariantRegistry::new()
            .in_process("X", push(5))
            .external("native", "backwards", |b: &Buffer| vec![b.0.len().to_string()])
            .finish();

        let child = VariantRegistry::<Wrapped>::new()
            .inherit_via(&base)
            .in_process("Y", |w: &mut Wrapped| {
                w.extra += 1;
                Ok(())
            })
            .finish();

        let mut wrapped = Wrapped {
            base: Buffer(vec![0; 4]),
            extra: 0,
        };
        match child.get("native") {
            Some(Variant::External { args, .. }) => assert_eq!(args(&wrapped), vec!["4"]),
            other => panic!("expected external variant, got {:?}", other),
        }

        for entry in child.iter() {
            if let Variant::InProcess(f) = &entry.variant {
                f(&mut wrapped).unwrap();
            }
        }

        assert_eq!(wrapped.base.0.len(), 5);
        assert_eq!(wrapped.extra, 1);
    }
}
