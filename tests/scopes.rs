use opscope::{DiError, Lifetime, Resolver, ServiceCollection};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_scoped_lifetime() {
    #[derive(Debug)]
    struct RequestContext {
        id: String,
    }

    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<RequestContext, _>(move |_| RequestContext {
        id: format!("req-{}", counter_clone.fetch_add(1, Ordering::SeqCst) + 1),
    });

    let sp = sc.build();

    let scope1 = sp.create_scope();
    let scope2 = sp.create_scope();

    let ctx1a = scope1.get_required::<RequestContext>();
    let ctx1b = scope1.get_required::<RequestContext>();
    let ctx2a = scope2.get_required::<RequestContext>();
    let ctx2b = scope2.get_required::<RequestContext>();

    assert!(Arc::ptr_eq(&ctx1a, &ctx1b));
    assert!(Arc::ptr_eq(&ctx2a, &ctx2b));
    assert!(!Arc::ptr_eq(&ctx1a, &ctx2a));

    assert_eq!(ctx1a.id, "req-1");
    assert_eq!(ctx2a.id, "req-2");
}

#[test]
fn test_cannot_resolve_scoped_from_root() {
    struct ScopedService;

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<ScopedService, _>(|_| ScopedService);

    let sp = sc.build();

    let result = sp.get::<ScopedService>();
    assert!(matches!(result, Err(DiError::WrongLifetime(_))));
    assert!(result.err().unwrap().is_configuration());
}

#[test]
fn test_singleton_cannot_capture_scoped_dependency() {
    struct RequestData;
    struct Cache {
        _data: Arc<RequestData>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<RequestData, _>(|_| RequestData);
    sc.register::<Cache, _>(Lifetime::Singleton, |r| {
        Ok(Cache {
            _data: r.get::<RequestData>()?,
        })
    });

    let sp = sc.build();
    let scope = sp.create_scope();

    // The singleton factory resolves through the root provider, not the scope.
    assert!(matches!(scope.get::<Cache>(), Err(DiError::WrongLifetime(_))));
}

#[test]
fn test_scoped_with_singleton_dependency() {
    struct Database {
        connection: String,
    }

    struct Repository {
        db: Arc<Database>,
        scope_id: String,
    }

    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Database {
        connection: "postgres://localhost".to_string(),
    });
    sc.add_scoped_factory::<Repository, _>(move |r| Repository {
        db: r.get_required::<Database>(),
        scope_id: format!("scope-{}", counter_clone.fetch_add(1, Ordering::SeqCst) + 1),
    });

    let sp = sc.build();

    let scope1 = sp.create_scope();
    let scope2 = sp.create_scope();

    let repo1 = scope1.get_required::<Repository>();
    let repo2 = scope2.get_required::<Repository>();

    assert!(!Arc::ptr_eq(&repo1, &repo2));
    assert_eq!(repo1.scope_id, "scope-1");
    assert_eq!(repo2.scope_id, "scope-2");

    assert!(Arc::ptr_eq(&repo1.db, &repo2.db));
    assert_eq!(repo1.db.connection, "postgres://localhost");
}

#[test]
fn test_transient_sees_the_enclosing_scope() {
    struct UserContext;

    struct RequestHandler {
        context: Arc<UserContext>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<UserContext, _>(|_| UserContext);
    sc.add_transient_factory::<RequestHandler, _>(|r| RequestHandler {
        context: r.get_required::<UserContext>(),
    });

    let sp = sc.build();
    let scope = sp.create_scope();

    let h1 = scope.get_required::<RequestHandler>();
    let h2 = scope.get_required::<RequestHandler>();
    assert!(!Arc::ptr_eq(&h1, &h2));
    assert!(Arc::ptr_eq(&h1.context, &h2.context));
}

#[test]
fn test_scoped_instances_are_dropped_with_the_scope() {
    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let drops = Arc::new(AtomicUsize::new(0));
    let drops_clone = drops.clone();

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Tracked, _>(move |_| Tracked(drops_clone.clone()));

    let sp = sc.build();
    {
        let scope = sp.create_scope();
        assert_eq!(scope.materialized(), 0);
        let tracked = scope.get_required::<Tracked>();
        assert_eq!(scope.materialized(), 1);
        drop(tracked);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
    }
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_scoped_construction_leaves_slot_empty() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();

    let mut sc = ServiceCollection::new();
    sc.register::<String, _>(Lifetime::Scoped, move |_| {
        match attempts_clone.fetch_add(1, Ordering::SeqCst) {
            0 => Err(DiError::construction::<String>("not yet")),
            n => Ok(format!("attempt-{n}")),
        }
    });

    let sp = sc.build();
    let scope = sp.create_scope();

    assert!(scope.get::<String>().is_err());
    assert_eq!(scope.materialized(), 0);

    let value = scope.get_required::<String>();
    assert_eq!(*value, "attempt-1");
    assert!(Arc::ptr_eq(&value, &scope.get_required::<String>()));
}
