// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end tests: an address book service served over in-memory
//! connections, with the server running on its own thread.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use trpc::exception::ExceptionType;
use trpc::payload::{self, Payload, StorageMode, StructRegistry, StructType};
use trpc::protocol::{MemoryProtocol, MultiplexedProtocol};
use trpc::rpc::{
    Client, Handler, HandlerError, MethodDef, MultiplexedProcessor, Process, Processor, RpcError,
    RpcResult, Server, ServiceDescriptor,
};
use trpc::types::{TypeDefBuilder, TypeShape, Value};

const NS: &str = "addressbook";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Clone)]
struct Types {
    phone: Arc<StructType>,
    person: Arc<StructType>,
    not_exists: Arc<StructType>,
    service: Arc<ServiceDescriptor>,
}

fn types() -> Types {
    let registry = payload::global();
    let phone = registry
        .synthesize(
            TypeDefBuilder::new(NS, "PhoneNumber")
                .field(1, "type", TypeShape::I32)
                .string_field(2, "number")
                .build()
                .unwrap(),
        )
        .unwrap();
    let person = registry
        .synthesize(
            TypeDefBuilder::new(NS, "Person")
                .string_field(1, "name")
                .list_field(2, "phones", TypeShape::structure(&phone))
                .field(4, "created_at", TypeShape::I64)
                .build()
                .unwrap(),
        )
        .unwrap();
    let not_exists = registry
        .synthesize(
            TypeDefBuilder::new(NS, "PersonNotExistsError")
                .field_with_default(1, "message", TypeShape::STRING, "Person Not Exists!")
                .exception()
                .build()
                .unwrap(),
        )
        .unwrap();
    let service = ServiceDescriptor::builder(NS, "AddressBookService")
        .method(MethodDef::new("ping"))
        .method(
            MethodDef::new("hello")
                .arg(1, "name", TypeShape::STRING)
                .returns(TypeShape::STRING),
        )
        .method(
            MethodDef::new("add")
                .arg(1, "person", TypeShape::structure(&person))
                .returns(TypeShape::BOOL),
        )
        .method(
            MethodDef::new("get")
                .arg(1, "name", TypeShape::STRING)
                .returns(TypeShape::structure(&person))
                .throws(1, "not_exists", &not_exists),
        )
        .method(
            MethodDef::new("remove")
                .arg(1, "name", TypeShape::STRING)
                .returns(TypeShape::BOOL)
                .throws(1, "not_exists", &not_exists),
        )
        .method(
            MethodDef::new("book")
                .returns(TypeShape::map(TypeShape::STRING, TypeShape::structure(&person))),
        )
        .method(MethodDef::new("log_event").arg(1, "event", TypeShape::STRING).oneway())
        .method(MethodDef::new("broken").returns(TypeShape::structure(&person)))
        .build(registry)
        .unwrap();
    Types {
        phone,
        person,
        not_exists,
        service,
    }
}

struct AddressBook {
    types: Types,
    people: Mutex<HashMap<String, Payload>>,
    events: AtomicUsize,
    calls: AtomicUsize,
}

impl AddressBook {
    fn new(types: Types) -> Self {
        Self {
            types,
            people: Mutex::new(HashMap::new()),
            events: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    fn not_exists(&self) -> HandlerError {
        HandlerError::raised(self.types.not_exists.new_instance())
    }

    fn name_arg(args: &[Value]) -> String {
        args.first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

impl Handler for AddressBook {
    fn handle(&self, method: &str, mut args: Vec<Value>) -> Result<Value, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match method {
            "ping" => Ok(Value::Null),
            "hello" => Ok(Value::from(format!("hello {}", Self::name_arg(&args)))),
            "add" => {
                let person = args
                    .remove(0)
                    .into_struct()
                    .ok_or_else(|| HandlerError::failed("add needs a person"))?;
                let name = person
                    .get("name")
                    .ok()
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                self.people.lock().insert(name, person);
                Ok(Value::Bool(true))
            }
            "get" => {
                let name = Self::name_arg(&args);
                match self.people.lock().get(&name) {
                    Some(person) => Ok(Value::from(person.clone())),
                    None => Err(self.not_exists()),
                }
            }
            "remove" => {
                let name = Self::name_arg(&args);
                match self.people.lock().remove(&name) {
                    Some(_) => Ok(Value::Bool(true)),
                    None => Err(self.not_exists()),
                }
            }
            "book" => {
                let people = self.people.lock();
                let mut entries: Vec<_> = people
                    .iter()
                    .map(|(name, person)| (Value::from(name.as_str()), Value::from(person.clone())))
                    .collect();
                entries.sort_by(|a, b| a.0.as_str().cmp(&b.0.as_str()));
                Ok(Value::Map(entries))
            }
            "log_event" => {
                self.events.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            }
            "broken" => Ok(Value::Null),
            other => Err(HandlerError::failed(format!("unexpected method {}", other))),
        }
    }
}

fn spawn_server<P: Process + 'static>(processor: P) -> (MemoryProtocol, JoinHandle<RpcResult<u64>>) {
    let (client_end, mut server_end) = MemoryProtocol::pair();
    let server = Server::new(processor);
    let handle = thread::spawn(move || server.serve(&mut server_end));
    (client_end, handle)
}

fn start(types: &Types) -> (Client<MemoryProtocol>, Arc<AddressBook>, JoinHandle<RpcResult<u64>>) {
    init_logging();
    let book = Arc::new(AddressBook::new(types.clone()));
    let processor = Processor::from_shared(types.service.clone(), book.clone());
    let (client_end, handle) = spawn_server(processor);
    (Client::new(types.service.clone(), client_end), book, handle)
}

fn bob(types: &Types) -> Payload {
    let phone = types
        .phone
        .construct(vec![1i32.into(), "555-0100".into()])
        .unwrap();
    types
        .person
        .construct_with(
            vec!["Bob".into(), Value::List(vec![phone.into()])],
            vec![("created_at", Value::I64(1_700_000_000))],
        )
        .unwrap()
}

#[test]
fn canonical_types_are_shared() {
    let first = types();
    let second = types();
    assert!(Arc::ptr_eq(&first.person, &second.person));
    assert!(Arc::ptr_eq(
        first.service.method("get").unwrap().result(),
        second.service.method("get").unwrap().result()
    ));

    let a = first.person.construct(vec!["Bob".into()]).unwrap();
    let b = second.person.construct(vec!["Bob".into()]).unwrap();
    assert_eq!(a, b);
    assert!(payload::global().is_instance(&a, &second.person));
    assert!(b.is_instance_of(&first.person));
}

#[test]
fn constructor_defaults_in_order() {
    let types = types();
    let err = types.not_exists.new_instance();
    assert_eq!(err.get("message").unwrap(), &Value::from("Person Not Exists!"));
    assert_eq!(
        err.to_string(),
        "PersonNotExistsError(message=\"Person Not Exists!\")"
    );

    let person = types.person.new_instance();
    let fields: Vec<_> = person.fields().map(|(name, _)| name).collect();
    assert_eq!(fields, vec!["name", "phones", "created_at"]);
    assert!(person.fields().all(|(_, v)| v.is_null()));
}

#[test]
fn open_and_fixed_storage() {
    let registry = StructRegistry::new();
    let def = TypeDefBuilder::new(NS, "Tag").string_field(1, "label").build().unwrap();

    let open = registry.synthesize(def.clone()).unwrap();
    let mut a = open.construct(vec!["x".into()]).unwrap();
    let b = open.construct(vec!["x".into()]).unwrap();
    a.set("scratch", 1i32).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), b.to_string());

    let fixed = StructRegistry::new()
        .synthesize(def.with_storage(StorageMode::Fixed))
        .unwrap();
    let mut c = fixed.new_instance();
    assert!(c.set("scratch", 1i32).is_err());
    assert!(c.get("scratch").is_err());
    c.set("label", "y").unwrap();
    assert_eq!(c.get("label").unwrap(), &Value::from("y"));
}

#[cfg(feature = "persistence")]
#[test]
fn persistence_survives_reset() {
    let registry = StructRegistry::new();
    let def = TypeDefBuilder::new(NS, "Contact")
        .string_field(1, "name")
        .field(2, "age", TypeShape::I32)
        .build()
        .unwrap();
    let before = registry.synthesize(def.clone()).unwrap();
    let original = before.construct(vec!["Alice".into(), 33i32.into()]).unwrap();
    let json = original.capture().unwrap().to_json().unwrap();

    registry.reset();
    let after = registry.synthesize(def).unwrap();
    let restored = payload::PayloadState::from_json(&json)
        .unwrap()
        .restore(&registry)
        .unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert!(Arc::ptr_eq(restored.struct_type(), &after));
    assert_eq!(restored, original);
}

#[test]
fn rpc_success_returns_value() {
    let types = types();
    let (mut client, _book, handle) = start(&types);

    assert_eq!(client.call("ping", vec![]).unwrap(), None);
    assert_eq!(
        client.call("hello", vec!["world".into()]).unwrap(),
        Some(Value::from("hello world"))
    );

    let bob = bob(&types);
    assert_eq!(
        client.call("add", vec![bob.clone().into()]).unwrap(),
        Some(Value::Bool(true))
    );
    let got = client
        .call("get", vec!["Bob".into()])
        .unwrap()
        .and_then(Value::into_struct)
        .unwrap();
    assert_eq!(got, bob);
    assert!(got.is_instance_of(&types.person));

    let book = client.call("book", vec![]).unwrap().unwrap();
    assert_eq!(book, Value::Map(vec![("Bob".into(), bob.into())]));

    client.close().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), 5);
}

#[test]
fn rpc_declared_exception() {
    let types = types();
    let (mut client, _book, handle) = start(&types);

    match client.call_with("remove", vec![], vec![("name", Value::from("nobody"))]) {
        Err(RpcError::Declared(exc)) => {
            assert_eq!(exc, types.not_exists.new_instance());
            assert!(exc.is_exception());
            assert_eq!(exc.get("message").unwrap(), &Value::from("Person Not Exists!"));
        }
        other => panic!("expected declared exception, got {:?}", other),
    }
    // The failure travelled as a REPLY, not an EXCEPTION message.
    assert_eq!(
        client.last_reply().map(|h| h.kind),
        Some(trpc::MessageType::Reply)
    );

    client.close().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), 1);
}

#[test]
fn rpc_oneway_gets_no_reply() {
    let types = types();
    let (mut client, book, handle) = start(&types);

    assert_eq!(client.call("log_event", vec!["login".into()]).unwrap(), None);
    assert_eq!(client.call("log_event", vec!["logout".into()]).unwrap(), None);
    // A later two-way call gets its own reply, not one for the oneway calls.
    assert_eq!(
        client.call("hello", vec!["again".into()]).unwrap(),
        Some(Value::from("hello again"))
    );
    assert_eq!(client.last_reply().map(|h| h.seqid), Some(2));
    assert_eq!(book.events.load(Ordering::SeqCst), 2);

    client.close().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), 3);
}

#[test]
fn rpc_unknown_method() {
    let types = types();
    init_logging();
    let book = Arc::new(AddressBook::new(types.clone()));
    let (client_end, handle) =
        spawn_server(Processor::from_shared(types.service.clone(), book.clone()));

    // A client built from a newer descriptor with one extra method.
    let newer = ServiceDescriptor::builder("addressbook_v2", "AddressBookService")
        .method(MethodDef::new("export").arg(1, "format", TypeShape::STRING))
        .build(&StructRegistry::new())
        .unwrap();
    let mut client = Client::new(newer, client_end);
    let err = client.call("export", vec!["csv".into()]).unwrap_err();
    assert_eq!(err.application_kind(), Some(ExceptionType::UnknownMethod));
    assert_eq!(err.to_string(), "Application exception: Unknown method");
    assert_eq!(book.calls.load(Ordering::SeqCst), 0);

    client.close().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), 1);
}

#[test]
fn rpc_missing_result() {
    let types = types();
    let (mut client, _book, handle) = start(&types);
    let err = client.call("broken", vec![]).unwrap_err();
    assert_eq!(err.application_kind(), Some(ExceptionType::MissingResult));
    client.close().unwrap();
    handle.join().unwrap().unwrap();
}

#[test]
fn rpc_multiplexed_routing() {
    let types = types();
    init_logging();
    let real = Arc::new(AddressBook::new(types.clone()));
    let impostor = Arc::new(AddressBook::new(types.clone()));
    impostor.people.lock().insert(
        "Bob".to_string(),
        types.person.construct(vec!["Impostor".into()]).unwrap(),
    );
    real.people.lock().insert("Bob".to_string(), bob(&types));

    let mux = MultiplexedProcessor::new();
    mux.register_processor("Addr", Processor::from_shared(types.service.clone(), real.clone()))
        .unwrap();
    mux.register_processor("Other", Processor::from_shared(types.service.clone(), impostor.clone()))
        .unwrap();

    let (client_end, handle) = spawn_server(mux);
    let mut client = Client::new(types.service.clone(), MultiplexedProtocol::new(client_end, "Addr"));
    let got = client.call("get", vec!["Bob".into()]).unwrap().unwrap();
    assert_eq!(got, Value::from(bob(&types)));
    assert_eq!(client.last_reply().map(|h| h.name.as_str()), Some("get"));
    assert_eq!(impostor.calls.load(Ordering::SeqCst), 0);

    let mut ghost = Client::new(
        types.service.clone(),
        MultiplexedProtocol::new(client.into_inner().into_inner(), "Ghost"),
    );
    let err = ghost.call("get", vec!["Bob".into()]).unwrap_err();
    assert_eq!(err.application_kind(), Some(ExceptionType::UnknownMethod));
    assert_eq!(real.calls.load(Ordering::SeqCst), 1);

    ghost.close().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), 2);
}
