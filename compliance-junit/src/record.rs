// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{deserialize::deserialize_document, errors::DeserializeError};
use indexmap::map::IndexMap;
use std::{io, time::Duration};

/// The root of a JUnit document.
///
/// Documents rooted at `<testsuites>` and documents rooted at a bare `<testsuite>` are both
/// represented this way. In the latter case, `name` is `None` and there is exactly one
/// testsuite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct JunitDocument {
    /// The name attribute of the `<testsuites>` element, if any.
    pub name: Option<String>,

    /// The test suites contained in this document, in document order.
    pub testsuites: Vec<Testsuite>,
}

impl JunitDocument {
    /// Creates a new, empty `JunitDocument`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a document from the given buffered reader.
    ///
    /// The reader is consumed as a stream; the full document is never held in memory as text.
    pub fn deserialize(reader: impl io::BufRead) -> Result<Self, DeserializeError> {
        deserialize_document(reader)
    }

    /// Reads a document from a string.
    pub fn deserialize_str(s: &str) -> Result<Self, DeserializeError> {
        Self::deserialize(s.as_bytes())
    }

    /// Adds a testsuite to this document.
    pub fn add_testsuite(&mut self, testsuite: Testsuite) -> &mut Self {
        self.testsuites.push(testsuite);
        self
    }

    /// Returns an iterator over all test cases in document order.
    pub fn testcases(&self) -> impl Iterator<Item = &TestCaseRecord> + '_ {
        self.testsuites
            .iter()
            .flat_map(|testsuite| testsuite.testcases.iter())
    }

    /// Consumes the document, returning all test cases in document order.
    pub fn into_testcases(self) -> Vec<TestCaseRecord> {
        self.testsuites
            .into_iter()
            .flat_map(|testsuite| testsuite.testcases)
            .collect()
    }
}

/// A single `<testsuite>` element.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Testsuite {
    /// The name of this testsuite.
    pub name: String,

    /// The overall time taken by the testsuite, as recorded in the document.
    pub time: Option<Duration>,

    /// The test cases in this testsuite, in document order.
    pub testcases: Vec<TestCaseRecord>,

    /// Custom properties recorded for this testsuite.
    pub properties: Vec<Property>,

    /// Data written to standard output while the testsuite was executed.
    pub system_out: Option<Output>,

    /// Data written to standard error while the testsuite was executed.
    pub system_err: Option<Output>,

    /// Other attributes, such as "tests", "failures" or "hostname".
    ///
    /// Counts are kept here verbatim rather than trusted: consumers derive outcomes from the test
    /// cases themselves.
    pub extra: IndexMap<String, String>,
}

impl Testsuite {
    /// Creates a new `Testsuite`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: None,
            testcases: vec![],
            properties: vec![],
            system_out: None,
            system_err: None,
            extra: IndexMap::new(),
        }
    }

    /// Sets the time taken for the testsuite.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Adds a property to this testsuite.
    pub fn add_property(&mut self, property: impl Into<Property>) -> &mut Self {
        self.properties.push(property.into());
        self
    }

    /// Adds a test case to this testsuite.
    pub fn add_testcase(&mut self, testcase: TestCaseRecord) -> &mut Self {
        self.testcases.push(testcase);
        self
    }

    /// Adds several test cases to this testsuite.
    pub fn add_testcases(
        &mut self,
        testcases: impl IntoIterator<Item = TestCaseRecord>,
    ) -> &mut Self {
        self.testcases.extend(testcases);
        self
    }
}

/// One parsed test-execution result.
///
/// The failure and skip markers are independent: a record may have both, either or neither.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct TestCaseRecord {
    /// The name of the test case. This is the display identity of the record.
    pub name: String,

    /// The "classname" of the test case.
    pub classname: Option<String>,

    /// The time it took to execute this test case.
    pub time: Option<Duration>,

    /// Set if the document contains a `<failure>` or `<error>` element for this test case.
    pub failure: Option<NonSuccess>,

    /// Set if the document contains a `<skipped>` element for this test case.
    pub skipped: Option<Skipped>,

    /// Data written to standard output while the test case was executed.
    pub system_out: Option<Output>,

    /// Data written to standard error while the test case was executed.
    pub system_err: Option<Output>,

    /// Other attributes found on the `<testcase>` element.
    pub extra: IndexMap<String, String>,
}

impl TestCaseRecord {
    /// Creates a new record with no failure or skip markers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classname: None,
            time: None,
            failure: None,
            skipped: None,
            system_out: None,
            system_err: None,
            extra: IndexMap::new(),
        }
    }

    /// Returns true if a failure or error was recorded for this test case.
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Returns true if this test case was marked as skipped.
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    /// Sets the classname of the test case.
    pub fn set_classname(&mut self, classname: impl Into<String>) -> &mut Self {
        self.classname = Some(classname.into());
        self
    }

    /// Sets the time taken for the test case.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Marks this test case as failed.
    pub fn set_failure(&mut self, failure: NonSuccess) -> &mut Self {
        self.failure = Some(failure);
        self
    }

    /// Marks this test case as skipped.
    pub fn set_skipped(&mut self, skipped: Skipped) -> &mut Self {
        self.skipped = Some(skipped);
        self
    }

    /// Sets standard output.
    pub fn set_system_out(&mut self, system_out: impl AsRef<str>) -> &mut Self {
        self.system_out = Some(Output::new(system_out.as_ref()));
        self
    }

    /// Sets standard error.
    pub fn set_system_err(&mut self, system_err: impl AsRef<str>) -> &mut Self {
        self.system_err = Some(Output::new(system_err.as_ref()));
        self
    }
}

/// A `<failure>` or `<error>` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonSuccess {
    /// Whether this was recorded as a failure or as an error.
    pub kind: NonSuccessKind,

    /// The failure message.
    pub message: Option<String>,

    /// The "type" of failure that occurred.
    pub ty: Option<String>,

    /// The description of the failure.
    ///
    /// This is read from the text node of the element.
    pub description: Option<String>,
}

impl NonSuccess {
    /// Creates a new `NonSuccess` of the given kind.
    pub fn new(kind: NonSuccessKind) -> Self {
        Self {
            kind,
            message: None,
            ty: None,
            description: None,
        }
    }

    /// Creates a new `NonSuccess` representing a `<failure>` element.
    pub fn failure() -> Self {
        Self::new(NonSuccessKind::Failure)
    }

    /// Creates a new `NonSuccess` representing an `<error>` element.
    pub fn error() -> Self {
        Self::new(NonSuccessKind::Error)
    }

    /// Sets the message.
    pub fn set_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the type.
    pub fn set_type(&mut self, ty: impl Into<String>) -> &mut Self {
        self.ty = Some(ty.into());
        self
    }

    /// Sets the description (text node).
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }
}

/// The kind of a [`NonSuccess`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NonSuccessKind {
    /// An expected failure, read from a `<failure>` element.
    Failure,

    /// An unexpected error, read from an `<error>` element.
    Error,
}

/// A `<skipped>` element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Skipped {
    /// The skip message.
    pub message: Option<String>,

    /// The description of the skip, read from the text node of the element.
    pub description: Option<String>,
}

impl Skipped {
    /// Creates a new `Skipped` with no message or description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message.
    pub fn set_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the description (text node).
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }
}

/// Custom properties recorded during test execution, e.g. environment variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// The name of the property.
    pub name: String,

    /// The value of the property.
    pub value: String,
}

impl Property {
    /// Creates a new `Property` instance.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl<T> From<(T, T)> for Property
where
    T: Into<String>,
{
    fn from((k, v): (T, T)) -> Self {
        Property::new(k, v)
    }
}

/// Text captured from standard output or standard error during test execution.
///
/// Control characters that cannot appear in XML are removed on construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    output: Box<str>,
}

impl Output {
    /// Creates a new output, removing any non-printable characters from it.
    pub fn new(output: impl AsRef<str>) -> Self {
        let output = output.as_ref();
        let output = output
            .replace(
                |c| matches!(c, '\x00'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f'),
                "",
            )
            .into_boxed_str();
        Self { output }
    }

    /// Returns the output.
    pub fn as_str(&self) -> &str {
        &self.output
    }

    /// Converts the output into a string.
    pub fn into_string(self) -> String {
        self.output.into_string()
    }
}

impl AsRef<str> for Output {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<Output> for String {
    fn from(output: Output) -> Self {
        output.into_string()
    }
}
