//! Derived components, enums and services working together through the dispatcher

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rockrpc_json::{JsonComponent, JsonEnum};
use rockrpc_server::{DispatcherConfig, JsonRpcDispatcher, rpc_service};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, JsonEnum)]
pub enum Format {
    Hardcover,
    Paperback,
    #[json(rename = "e-book")]
    EBook,
}

#[derive(Debug, Default, Clone, PartialEq, JsonComponent)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub format: Option<Format>,
    pub authors: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, JsonComponent)]
#[json(rename = "Loan")]
pub struct Loan {
    pub isbn: String,
    pub member: String,
    #[json(rename = "due")]
    pub due_at: Option<DateTime<Utc>>,
    #[json(skip)]
    pub internal_note: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("No book with ISBN {0}")]
    UnknownBook(String),
    #[error("Book {0} is already on loan")]
    AlreadyLoaned(String),
}

#[derive(Default)]
struct Library {
    books: Mutex<BTreeMap<String, Book>>,
    loans: Mutex<Vec<Loan>>,
}

#[rpc_service(name = "Library", description = "Lending desk")]
impl Library {
    #[rpc_method(name = "addBook", description = "Adds a book to the catalogue")]
    fn add_book(&self, book: Book) -> usize {
        let mut books = self.books.lock();
        books.insert(book.isbn.clone(), book);
        books.len()
    }

    #[rpc_method(name = "findByFormat")]
    fn find_by_format(&self, format: Format) -> Vec<Book> {
        self.books
            .lock()
            .values()
            .filter(|book| book.format == Some(format))
            .cloned()
            .collect()
    }

    #[rpc_method(name = "lend")]
    fn lend(
        &self,
        isbn: String,
        #[rpc_param(name = "memberName")] member: String,
        from: DateTime<Utc>,
    ) -> Result<Loan, LibraryError> {
        if !self.books.lock().contains_key(&isbn) {
            return Err(LibraryError::UnknownBook(isbn));
        }
        let mut loans = self.loans.lock();
        if loans.iter().any(|loan| loan.isbn == isbn) {
            return Err(LibraryError::AlreadyLoaned(isbn));
        }
        let loan = Loan {
            isbn,
            member,
            due_at: Some(from + Duration::days(14)),
            internal_note: "desk".into(),
        };
        loans.push(loan.clone());
        Ok(loan)
    }

    #[rpc_method(name = "shelfCounts")]
    fn shelf_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for book in self.books.lock().values() {
            let key = match book.format {
                Some(Format::Hardcover) => "hardcover",
                Some(Format::Paperback) => "paperback",
                Some(Format::EBook) => "e-book",
                None => "unknown",
            };
            *counts.entry(key.to_string()).or_insert(0) += 1;
        }
        counts
    }

    #[rpc_method(name = "echo")]
    fn echo(&self, value: Value) -> Value {
        value
    }

    #[rpc_method(name = "tagAll", obsolete)]
    fn tag_all(&self, tag: String, #[rpc_param(variadic)] isbns: Vec<String>) -> usize {
        let books = self.books.lock();
        isbns
            .iter()
            .filter(|isbn| books.contains_key(isbn.as_str()))
            .count()
            * usize::from(!tag.is_empty())
    }
}

fn stocked() -> JsonRpcDispatcher {
    let dispatcher = JsonRpcDispatcher::new(Arc::new(Library::default()));
    for book in [
        r#"{"isbn":"1","title":"Dune","format":"Paperback","authors":["Herbert"]}"#,
        r#"{"isbn":"2","title":"SICP","format":"hardcover","authors":["Abelson","Sussman"]}"#,
        r#"{"isbn":"3","title":"TAPL","format":"e-book"}"#,
    ] {
        let request = format!(r#"{{"id":0,"method":"addBook","params":[{book}]}}"#);
        let response = call(&dispatcher, &request);
        assert!(response.get("error").is_none(), "{response}");
    }
    dispatcher
}

fn call(dispatcher: &JsonRpcDispatcher, request: &str) -> Value {
    let text = dispatcher.process_text(request).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_component_parameter() {
    let dispatcher = stocked();
    let response = call(
        &dispatcher,
        r#"{"id":1,"method":"addBook","params":{"book":{"isbn":"4","title":"Emma"}}}"#,
    );
    assert_eq!(response, json!({"id": 1, "result": 4}));
}

#[test]
fn test_enum_parameter_and_component_list_result() {
    let dispatcher = stocked();
    let response = call(
        &dispatcher,
        r#"{"id":"q","method":"findByFormat","params":["HARDCOVER"]}"#,
    );
    assert_eq!(
        response,
        json!({
            "id": "q",
            "result": [{
                "isbn": "2",
                "title": "SICP",
                "format": "Hardcover",
                "authors": ["Abelson", "Sussman"],
            }]
        })
    );

    let response = call(
        &dispatcher,
        r#"{"id":2,"method":"findByFormat","params":["Audiobook"]}"#,
    );
    assert_eq!(response["error"]["code"], json!(-32602));
    assert!(response.get("result").is_none());
}

#[test]
fn test_renamed_parameter_and_date_time() {
    let dispatcher = stocked();
    let response = call(
        &dispatcher,
        r#"{"id":3,"method":"lend","params":{"isbn":"1","memberName":"ada","from":"2024-05-01T12:00:00Z"}}"#,
    );
    assert_eq!(
        response["result"],
        json!({"isbn": "1", "member": "ada", "due": "2024-05-15T12:00:00Z"})
    );

    // Epoch seconds are accepted for date/time parameters
    let response = call(
        &dispatcher,
        r#"{"id":4,"method":"lend","params":["2","grace",0]}"#,
    );
    assert_eq!(response["result"]["due"], json!("1970-01-15T00:00:00Z"));
}

#[test]
fn test_target_errors_keep_their_type_name() {
    let dispatcher = stocked();
    call(&dispatcher, r#"{"id":1,"method":"lend","params":["1","ada","2024-05-01T12:00:00Z"]}"#);
    let response = call(
        &dispatcher,
        r#"{"id":2,"method":"lend","params":["1","bob","2024-05-02T12:00:00Z"]}"#,
    );
    assert_eq!(
        response["error"],
        json!({
            "name": "JSONRPCError",
            "code": -32000,
            "message": "Book 1 is already on loan",
            "errors": [{"name": "LibraryError", "message": "Book 1 is already on loan"}],
        })
    );

    let remote = JsonRpcDispatcher::new(Arc::new(Library::default()))
        .with_config(DispatcherConfig::default().with_local_execution(false));
    let response = call(
        &remote,
        r#"{"id":3,"method":"lend","params":["9","bob","2024-05-02T12:00:00Z"]}"#,
    );
    assert_eq!(
        response["error"]["message"],
        json!("An error occurred while executing the method.")
    );
    assert!(response["error"].get("errors").is_none());
}

#[test]
fn test_map_result() {
    let response = call(&stocked(), r#"{"id":5,"method":"shelfCounts"}"#);
    assert_eq!(
        response["result"],
        json!({"e-book": 1, "hardcover": 1, "paperback": 1})
    );
}

#[test]
fn test_arbitrary_values_round_trip() {
    let dispatcher = JsonRpcDispatcher::new(Arc::new(Library::default()));
    for value in [
        json!(null),
        json!(false),
        json!(-0.25),
        json!("line\nbreak"),
        json!([1, [2, [3, []]]]),
        json!({"nested": {"list": [null, true, "x"], "empty": {}}}),
    ] {
        let request = json!({"id": 7, "method": "echo", "params": [value.clone()]});
        let response = call(&dispatcher, &request.to_string());
        assert_eq!(response["result"], value, "{request}");
    }
}

#[test]
fn test_obsolete_variadic_method() {
    let dispatcher = stocked();
    let response = call(
        &dispatcher,
        r#"{"id":8,"method":"tagAll","params":["classic","1","3","99"]}"#,
    );
    assert_eq!(response["result"], json!(2));

    let response = call(
        &dispatcher,
        r#"{"id":9,"method":"tagAll","params":["classic",["1","2"]]}"#,
    );
    assert_eq!(response["result"], json!(2));

    let about = call(&dispatcher, r#"{"id":10,"method":"system.about"}"#);
    let methods = about["result"]["methods"].as_array().unwrap();
    let tag_all = methods.iter().find(|m| m["name"] == "tagAll").unwrap();
    assert_eq!(tag_all["obsolete"], json!("This method is obsolete."));
    assert_eq!(tag_all["parameters"], json!(["tag", "isbns"]));
    let lend = methods.iter().find(|m| m["name"] == "lend").unwrap();
    assert_eq!(lend["parameters"], json!(["isbn", "memberName", "from"]));
}
