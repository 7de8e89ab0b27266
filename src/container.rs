use crate::constants::LOGGER_SERVICE;
use crate::logger::Logger;
use crate::{Error, RouteError};
use once_cell::sync::OnceCell;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Type-erased instance. The payload is always an `Arc<T>` so that unsized services such as
// `dyn Logger` can be stored and handed back without cloning the service itself.
type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&ServiceContainer) -> Result<Instance, RouteError> + Send + Sync + 'static>;

#[derive(Clone)]
struct Registration {
    factory: Factory,
    type_name: &'static str,
    // `Some` for singletons. A fresh cell is created on every registration, so re-registering a
    // name discards the previously cached instance.
    singleton: Option<Arc<OnceCell<Instance>>>,
}

/// A registry of named service factories with singleton or transient lifecycle.
///
/// Services are resolved by name and type. A singleton is constructed by the first
/// [`resolve`](ServiceContainer::resolve) call and cached; concurrent first calls for the same name
/// run the factory exactly once and all observe the same instance, while resolutions of other names
/// proceed without waiting on it. A transient service is constructed on every call.
///
/// Factories receive the container itself, so a service declares its dependencies as constructor
/// parameters and resolves them while being built.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use switchyard::ServiceContainer;
///
/// struct Config {
///     greeting: String,
/// }
///
/// struct Greeter {
///     config: Arc<Config>,
/// }
///
/// let container = ServiceContainer::new();
/// container.register("config", |_| Arc::new(Config { greeting: "hello".into() }), true);
/// container.try_register(
///     "greeter",
///     |c| Ok(Arc::new(Greeter { config: c.resolve::<Config>("config")? })),
///     false,
/// );
///
/// let greeter = container.resolve::<Greeter>("greeter").unwrap();
/// assert_eq!(greeter.config.greeting, "hello");
/// assert!(container.resolve::<Greeter>("missing").is_err());
/// ```
#[derive(Default)]
pub struct ServiceContainer {
    registrations: RwLock<HashMap<String, Registration>>,
}

impl ServiceContainer {
    pub fn new() -> ServiceContainer {
        ServiceContainer::default()
    }

    /// Registers an infallible factory. The last registration of a name wins.
    pub fn register<T, F>(&self, name: impl Into<String>, factory: F, singleton: bool)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceContainer) -> Arc<T> + Send + Sync + 'static,
    {
        self.try_register::<T, _>(name, move |container| Ok(factory(container)), singleton)
    }

    /// Registers a fallible factory.
    ///
    /// When the factory of a singleton fails, nothing is cached and the next `resolve` call runs it
    /// again.
    pub fn try_register<T, F>(&self, name: impl Into<String>, factory: F, singleton: bool)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceContainer) -> Result<Arc<T>, RouteError> + Send + Sync + 'static,
    {
        let name = name.into();
        let factory: Factory = Arc::new(move |container| factory(container).map(|service| Arc::new(service) as Instance));

        let registration = Registration {
            factory,
            type_name: type_name::<T>(),
            singleton: if singleton { Some(Arc::new(OnceCell::new())) } else { None },
        };

        tracing::debug!(service = %name, ty = registration.type_name, singleton, "registering service");

        if self.write().insert(name.clone(), registration).is_some() {
            tracing::debug!(service = %name, "replaced an existing service registration");
        }
    }

    /// Resolves the service registered under `name` as an `Arc<T>`.
    ///
    /// Fails with [`Error::ServiceNotRegistered`] for unknown names, with
    /// [`Error::ServiceTypeMismatch`] when the registration holds another type, and with
    /// [`Error::ServiceConstruction`] when the factory fails.
    pub fn resolve<T>(&self, name: &str) -> crate::Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        // Clone the registration out so that no lock is held while a factory runs.
        let registration = self
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ServiceNotRegistered(name.to_owned()))?;

        let instance = match registration.singleton {
            Some(ref cell) => cell
                .get_or_try_init(|| self.construct(name, &registration))?
                .clone(),
            None => self.construct(name, &registration)?,
        };

        instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| Error::ServiceTypeMismatch {
                name: name.to_owned(),
                expected: type_name::<T>(),
            })
    }

    /// Resolves the `logger` service as a [`Logger`].
    pub fn logger(&self) -> crate::Result<Arc<dyn Logger>> {
        self.resolve::<dyn Logger>(LOGGER_SERVICE)
    }

    /// Checks whether a service is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn construct(&self, name: &str, registration: &Registration) -> crate::Result<Instance> {
        tracing::debug!(service = name, ty = registration.type_name, "constructing service");

        (registration.factory)(self).map_err(|source| Error::ServiceConstruction {
            name: name.to_owned(),
            source,
        })
    }

    // The map is only written by `try_register`, after the new registration is fully built, so a
    // poisoned lock never guards a half-written entry.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Registration>> {
        self.registrations.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Registration>> {
        self.registrations.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for ServiceContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let registrations = self.read();
        let mut services: Vec<_> = registrations
            .iter()
            .map(|(name, r)| (name.as_str(), r.type_name, r.singleton.is_some()))
            .collect();
        services.sort_unstable();
        f.debug_struct("ServiceContainer").field("services", &services).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[derive(Debug)]
    struct Counter {
        id: usize,
    }

    #[test]
    fn should_construct_singleton_once_across_threads() {
        let container = Arc::new(ServiceContainer::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let factory_calls = calls.clone();
        container.register(
            "counter",
            move |_| {
                let id = factory_calls.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(20));
                Arc::new(Counter { id })
            },
            true,
        );

        let callers = 16;
        let barrier = Arc::new(Barrier::new(callers));
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let container = container.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    container.resolve::<Counter>("counter").unwrap()
                })
            })
            .collect();

        let instances: Vec<Arc<Counter>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
        assert_eq!(instances[0].id, 0);
    }

    #[test]
    fn should_construct_transient_every_time() {
        let container = ServiceContainer::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let factory_calls = calls.clone();
        container.register(
            "counter",
            move |_| Arc::new(Counter { id: factory_calls.fetch_add(1, Ordering::SeqCst) }),
            false,
        );

        let a = container.resolve::<Counter>("counter").unwrap();
        let b = container.resolve::<Counter>("counter").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.id, b.id);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn should_report_unregistered_name() {
        let container = ServiceContainer::new();
        match container.resolve::<Counter>("nope") {
            Err(Error::ServiceNotRegistered(name)) => assert_eq!(name, "nope"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn should_report_type_mismatch() {
        let container = ServiceContainer::new();
        container.register("counter", |_| Arc::new(Counter { id: 1 }), true);
        match container.resolve::<String>("counter") {
            Err(Error::ServiceTypeMismatch { name, .. }) => assert_eq!(name, "counter"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn should_let_last_registration_win() {
        let container = ServiceContainer::new();
        container.register("counter", |_| Arc::new(Counter { id: 1 }), true);
        assert_eq!(container.resolve::<Counter>("counter").unwrap().id, 1);

        container.register("counter", |_| Arc::new(Counter { id: 2 }), true);
        assert_eq!(container.resolve::<Counter>("counter").unwrap().id, 2);
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn should_retry_failed_singleton_factory() {
        let container = ServiceContainer::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let factory_calls = calls.clone();
        container.try_register(
            "flaky",
            move |_| {
                if factory_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("not ready yet".into())
                } else {
                    Ok(Arc::new(Counter { id: 7 }))
                }
            },
            true,
        );

        assert!(matches!(
            container.resolve::<Counter>("flaky"),
            Err(Error::ServiceConstruction { .. })
        ));
        assert_eq!(container.resolve::<Counter>("flaky").unwrap().id, 7);
        assert_eq!(container.resolve::<Counter>("flaky").unwrap().id, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn should_survive_panicking_factory() {
        let container = ServiceContainer::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let factory_calls = calls.clone();
        container.register(
            "fragile",
            move |_| {
                if factory_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("first construction fails");
                }
                Arc::new(Counter { id: 3 })
            },
            true,
        );

        let first = panic::catch_unwind(AssertUnwindSafe(|| container.resolve::<Counter>("fragile")));
        assert!(first.is_err());
        assert_eq!(container.resolve::<Counter>("fragile").unwrap().id, 3);
    }

    #[test]
    fn should_inject_dependencies_through_factories() {
        struct Repo;
        struct UserService {
            repo: Arc<Repo>,
        }

        let container = ServiceContainer::new();
        container.register("repo", |_| Arc::new(Repo), true);
        container.try_register(
            "users",
            |c| Ok(Arc::new(UserService { repo: c.resolve::<Repo>("repo")? })),
            true,
        );

        let users = container.resolve::<UserService>("users").unwrap();
        let repo = container.resolve::<Repo>("repo").unwrap();
        assert!(Arc::ptr_eq(&users.repo, &repo));
    }
}
