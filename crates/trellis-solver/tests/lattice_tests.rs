use crate::errors::LatticeError;
use crate::lattice::{Bound, LatticePolicy};
use crate::test_fixtures::Fixture;
use crate::types::{ClassId, DeclId, TypeData, TypeId};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[test]
fn test_derives_from_per_variant() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let (dog, cat) = (fx.ty(fx.dog), fx.ty(fx.cat));

    assert!(lattice.derives_from(dog, fx.animal).unwrap());
    assert!(!lattice.derives_from(dog, fx.cat).unwrap());
    assert!(lattice.derives_from(TypeId::UNTYPED, fx.dog).unwrap());
    assert!(lattice.derives_from(fx.interner.literal_integer(1), ClassId::INTEGER).unwrap());
    assert!(lattice.derives_from(fx.list_of(dog), fx.list).unwrap());

    assert!(lattice.derives_from(fx.union(dog, cat), fx.animal).unwrap());
    assert!(!lattice.derives_from(fx.union(dog, TypeId::INTEGER), fx.animal).unwrap());
    let comparable_cat = fx.intersection(cat, fx.ty(fx.comparable));
    assert!(lattice.derives_from(comparable_cat, fx.comparable).unwrap());
    assert!(lattice.derives_from(comparable_cat, fx.animal).unwrap());

    assert!(!lattice.derives_from(fx.interner.meta(dog), ClassId::OBJECT).unwrap());
    assert!(!lattice.derives_from(fx.var(1), ClassId::OBJECT).unwrap());
    assert!(matches!(
        lattice.derives_from(fx.interner.alias(DeclId(5)), ClassId::OBJECT),
        Err(LatticeError::UnresolvedAlias { .. })
    ));
}

#[test]
fn test_underlying_of_proxies() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let key = fx.interner.literal_symbol("k");

    assert_eq!(
        lattice.underlying(fx.interner.literal_string("s")).unwrap(),
        TypeId::STRING
    );
    assert_eq!(
        lattice.underlying(fx.interner.literal_bool(false)).unwrap(),
        TypeId::FALSE_CLASS
    );
    assert_eq!(
        lattice.underlying(fx.interner.shape(&[key], &[TypeId::INTEGER])).unwrap(),
        fx.interner.hash_of_untyped()
    );
    assert_eq!(
        lattice.underlying(fx.interner.meta(fx.ty(fx.dog))).unwrap(),
        TypeId::OBJECT
    );
    assert_eq!(lattice.underlying(fx.ty(fx.dog)).unwrap(), fx.ty(fx.dog));
}

#[test]
fn test_tuple_underlying_joins_elements() {
    let fx = Fixture::new();
    let lattice = fx.lattice();

    let pair = lattice.tuple(&[TypeId::INTEGER, TypeId::STRING]).unwrap();
    assert_eq!(
        lattice.underlying(pair).unwrap(),
        fx.interner.array_of(fx.union(TypeId::INTEGER, TypeId::STRING))
    );

    let pets = lattice.tuple(&[fx.ty(fx.dog), fx.ty(fx.animal)]).unwrap();
    assert_eq!(
        lattice.underlying(pets).unwrap(),
        fx.interner.array_of(fx.ty(fx.animal))
    );

    let empty = lattice.tuple(&[]).unwrap();
    assert_eq!(
        lattice.underlying(empty).unwrap(),
        fx.interner.array_of(TypeId::BOTTOM)
    );
    let Some(TypeData::Tuple { elements, .. }) = fx.interner.lookup(empty) else {
        panic!("expected a tuple");
    };
    assert!(fx.interner.type_list(elements).is_empty());
}

#[test]
fn test_policy_controls_verification() {
    assert_eq!(LatticePolicy::default().verify_results, cfg!(debug_assertions));
    let policy = LatticePolicy::default().with_verify_results(false);
    assert!(!policy.verify_results);

    let fx = Fixture::new();
    let unchecked = fx.lattice().with_policy(policy);
    assert_eq!(unchecked.policy(), policy);
    let (dog, cat) = (fx.ty(fx.dog), fx.ty(fx.cat));
    assert_eq!(unchecked.join(dog, cat).unwrap(), fx.lattice().join(dog, cat).unwrap());
    assert_eq!(unchecked.meet(dog, cat).unwrap(), TypeId::BOTTOM);
}

#[test]
fn test_verify_bound_checks_the_requested_side() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let (animal, dog, cat) = (fx.ty(fx.animal), fx.ty(fx.dog), fx.ty(fx.cat));

    assert_eq!(lattice.verify_bound(Bound::Upper, animal, dog, cat), Ok(()));
    assert_eq!(
        lattice.verify_bound(Bound::Lower, animal, dog, cat),
        Err(LatticeError::ConsistencyViolation {
            op: "meet",
            result: "Animal".into(),
            left: "Dog".into(),
            right: "Cat".into(),
        })
    );
    assert_eq!(lattice.verify_bound(Bound::Lower, TypeId::BOTTOM, dog, cat), Ok(()));
}

#[test]
fn test_lattice_formats_types() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let pets = lattice.join(fx.ty(fx.dog), fx.ty(fx.cat)).unwrap();
    assert_eq!(lattice.format(pets), "Dog | Cat");
    assert_eq!(lattice.format(fx.list_of(pets)), "List[Dog | Cat]");
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_queries_emit_json_trace_events() {
    let fx = Fixture::new();
    let lattice = fx.lattice();
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(capture.clone())
        .finish();

    let (joined, related) = tracing::subscriber::with_default(subscriber, || {
        let joined = lattice.join(fx.ty(fx.dog), fx.ty(fx.animal)).unwrap();
        let related = lattice.is_subtype(fx.ty(fx.dog), fx.ty(fx.animal)).unwrap();
        (joined, related)
    });
    assert_eq!(joined, fx.ty(fx.animal));
    assert!(related);

    let output = capture.contents();
    assert!(output.contains("trellis::query_json"), "{output}");
    assert!(output.contains("\"op\":\"join\""), "{output}");
    assert!(output.contains("\"op\":\"is_subtype\""), "{output}");
    assert!(output.contains("\"phase\":\"end\""), "{output}");
}
