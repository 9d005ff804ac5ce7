use crate::error::Result;
use std::rc::Rc;

/// A setting given either as a constant or as a function of the item
#[derive(Clone)]
pub enum Resolve<T, F> {
    Fixed(T),
    Computed(F),
}

impl<T, F> Resolve<T, F> {
    pub fn fixed(&self) -> Option<&T> {
        match self {
            Resolve::Fixed(value) => Some(value),
            Resolve::Computed(_) => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Resolve::Computed(_))
    }
}

pub type KindFn<I, K> = Rc<dyn Fn(&I) -> Result<K>>;
pub type HeightFn<I, K> = Rc<dyn Fn(&I, &K) -> Result<f64>>;

/// `cellType`: which kind of cell displays an item
pub type CellType<I, K> = Resolve<K, KindFn<I, K>>;
/// `itemHeight`: how tall the row for an item is
pub type ItemHeight<I, K> = Resolve<f64, HeightFn<I, K>>;

impl<I, K> CellType<I, K> {
    pub fn computed(f: impl Fn(&I) -> Result<K> + 'static) -> Self {
        Resolve::Computed(Rc::new(f))
    }
}

impl<I, K> ItemHeight<I, K> {
    pub fn computed(f: impl Fn(&I, &K) -> Result<f64> + 'static) -> Self {
        Resolve::Computed(Rc::new(f))
    }
}

/// Maps items to a cell kind and a height. Results are never cached, the script may swap
/// classification at any time.
pub struct TypeResolver<I, K> {
    cell_type: CellType<I, K>,
    item_height: ItemHeight<I, K>,
}

impl<I, K: Clone + Default> TypeResolver<I, K> {
    pub fn new() -> Self {
        Self {
            cell_type: Resolve::Fixed(K::default()),
            item_height: Resolve::Fixed(0.0),
        }
    }

    pub fn cell_type(&self) -> &CellType<I, K> {
        &self.cell_type
    }

    pub fn set_cell_type(&mut self, cell_type: CellType<I, K>) {
        self.cell_type = cell_type;
    }

    pub fn item_height(&self) -> &ItemHeight<I, K> {
        &self.item_height
    }

    pub fn set_item_height(&mut self, item_height: ItemHeight<I, K>) {
        self.item_height = item_height;
    }

    pub fn resolve_kind(&self, item: &I) -> Result<K> {
        match &self.cell_type {
            Resolve::Fixed(kind) => Ok(kind.clone()),
            Resolve::Computed(f) => f(item),
        }
    }

    pub fn resolve_height(&self, item: &I, kind: &K) -> Result<f64> {
        match &self.item_height {
            Resolve::Fixed(height) => Ok(*height),
            Resolve::Computed(f) => f(item, kind),
        }
    }
}

impl<I, K: Clone + Default> Default for TypeResolver<I, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, K: Clone> Clone for TypeResolver<I, K> {
    fn clone(&self) -> Self {
        Self {
            cell_type: self.cell_type.clone(),
            item_height: self.item_height.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectionError;
    use crate::kinds::{DecodedKind, KindTable};
    use std::cell::Cell;

    #[test]
    fn test_defaults() {
        let resolver: TypeResolver<&str, String> = TypeResolver::new();
        assert_eq!(resolver.resolve_kind(&"a").unwrap(), "");
        assert_eq!(resolver.resolve_height(&"a", &String::new()).unwrap(), 0.0);
    }

    #[test]
    fn test_fixed_and_computed() {
        let mut resolver: TypeResolver<u32, String> = TypeResolver::new();
        resolver.set_cell_type(Resolve::Fixed("row".to_string()));
        assert_eq!(resolver.resolve_kind(&1).unwrap(), "row");

        resolver.set_cell_type(CellType::computed(|n: &u32| {
            Ok(if n % 2 == 0 { "even" } else { "odd" }.to_string())
        }));
        resolver.set_item_height(ItemHeight::computed(|_: &u32, kind: &String| {
            Ok(if kind == "even" { 40.0 } else { 20.0 })
        }));

        let kind = resolver.resolve_kind(&4).unwrap();
        assert_eq!(kind, "even");
        assert_eq!(resolver.resolve_height(&4, &kind).unwrap(), 40.0);
        assert_eq!(resolver.resolve_height(&3, &"odd".to_string()).unwrap(), 20.0);
        assert!(resolver.cell_type().is_computed());
    }

    #[test]
    fn test_no_caching_between_calls() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut resolver: TypeResolver<u32, u32> = TypeResolver::new();
        resolver.set_cell_type(CellType::computed(move |n: &u32| {
            counter.set(counter.get() + 1);
            Ok(*n)
        }));

        resolver.resolve_kind(&1).unwrap();
        resolver.resolve_kind(&1).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_errors_propagate() {
        let mut resolver: TypeResolver<u32, u32> = TypeResolver::new();
        resolver.set_cell_type(CellType::computed(|_: &u32| {
            Err(CollectionError::invalid("no kind"))
        }));
        assert!(resolver.resolve_kind(&1).is_err());
    }

    #[test]
    fn test_resolve_encode_decode_round_trip() {
        let mut resolver: TypeResolver<u32, String> = TypeResolver::new();
        resolver.set_cell_type(CellType::computed(|n: &u32| Ok(format!("kind-{}", n % 3))));
        let mut table = KindTable::new();

        for item in 0..10u32 {
            let kind = resolver.resolve_kind(&item).unwrap();
            let id = table.encode(kind.clone());
            assert_eq!(table.decode(id), DecodedKind::Known(kind));
        }
        assert_eq!(table.len(), 3);
    }
}
