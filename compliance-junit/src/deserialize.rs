// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deserialize a `JunitDocument`.

use crate::{
    DeserializeError, JunitDocument, NonSuccess, NonSuccessKind, Output, Property, Skipped,
    TestCaseRecord, Testsuite,
};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{io, time::Duration};

const TESTSUITES_TAG: &[u8] = b"testsuites";
const TESTSUITE_TAG: &[u8] = b"testsuite";
const TESTCASE_TAG: &[u8] = b"testcase";
const PROPERTIES_TAG: &[u8] = b"properties";
const PROPERTY_TAG: &[u8] = b"property";
const FAILURE_TAG: &[u8] = b"failure";
const ERROR_TAG: &[u8] = b"error";
const SKIPPED_TAG: &[u8] = b"skipped";
const SYSTEM_OUT_TAG: &[u8] = b"system-out";
const SYSTEM_ERR_TAG: &[u8] = b"system-err";

pub(crate) fn deserialize_document(
    reader: impl io::BufRead,
) -> Result<JunitDocument, DeserializeError> {
    let mut reader = DocumentReader::new(reader);
    let mut document = JunitDocument::new();
    let mut saw_root = false;

    loop {
        let (start, empty) = match reader.next()? {
            Event::Start(start) => (start, false),
            Event::Empty(start) => (start, true),
            Event::Eof => break,
            // Declarations, comments, doctypes and whitespace between elements.
            _ => continue,
        };

        match start.local_name().as_ref() {
            TESTSUITES_TAG => read_testsuites(&mut reader, &start, empty, &mut document)?,
            TESTSUITE_TAG => {
                let testsuite = read_testsuite(&mut reader, &start, empty)?;
                document.add_testsuite(testsuite);
            }
            other => {
                return Err(DeserializeError::UnexpectedRoot {
                    name: String::from_utf8_lossy(other).into_owned(),
                    position: reader.position(),
                });
            }
        }
        saw_root = true;
    }

    if !saw_root {
        return Err(DeserializeError::MissingRoot);
    }
    Ok(document)
}

fn read_testsuites<R: io::BufRead>(
    reader: &mut DocumentReader<R>,
    start: &BytesStart<'_>,
    empty: bool,
    document: &mut JunitDocument,
) -> Result<(), DeserializeError> {
    for (key, value) in reader.attributes(start)? {
        if key == "name" {
            document.name = Some(value);
        }
    }
    if empty {
        return Ok(());
    }

    loop {
        match reader.next()? {
            Event::Start(child) => {
                if child.local_name().as_ref() == TESTSUITE_TAG {
                    let testsuite = read_testsuite(reader, &child, false)?;
                    document.add_testsuite(testsuite);
                } else {
                    reader.skip_element(&child)?;
                }
            }
            Event::Empty(child) => {
                if child.local_name().as_ref() == TESTSUITE_TAG {
                    let testsuite = read_testsuite(reader, &child, true)?;
                    document.add_testsuite(testsuite);
                }
            }
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(unexpected_eof(TESTSUITES_TAG)),
            _ => {}
        }
    }
}

fn read_testsuite<R: io::BufRead>(
    reader: &mut DocumentReader<R>,
    start: &BytesStart<'_>,
    empty: bool,
) -> Result<Testsuite, DeserializeError> {
    let mut testsuite = Testsuite::new("");
    for (key, value) in reader.attributes(start)? {
        match key.as_str() {
            "name" => testsuite.name = value,
            "time" => {
                let time = parse_time("testsuite", value, reader.position())?;
                testsuite.set_time(time);
            }
            _ => {
                testsuite.extra.insert(key, value);
            }
        }
    }
    if empty {
        return Ok(testsuite);
    }

    loop {
        let (child, child_empty) = match reader.next()? {
            Event::Start(child) => (child, false),
            Event::Empty(child) => (child, true),
            Event::End(_) => return Ok(testsuite),
            Event::Eof => return Err(unexpected_eof(TESTSUITE_TAG)),
            _ => continue,
        };

        match child.local_name().as_ref() {
            TESTCASE_TAG => {
                let testcase = read_testcase(reader, &child, child_empty)?;
                testsuite.add_testcase(testcase);
            }
            PROPERTIES_TAG if !child_empty => {
                read_properties(reader, &mut testsuite)?;
            }
            SYSTEM_OUT_TAG if !child_empty => {
                testsuite.system_out = reader.read_text(SYSTEM_OUT_TAG)?.map(Output::new);
            }
            SYSTEM_ERR_TAG if !child_empty => {
                testsuite.system_err = reader.read_text(SYSTEM_ERR_TAG)?.map(Output::new);
            }
            _ if child_empty => {}
            _ => reader.skip_element(&child)?,
        }
    }
}

fn read_properties<R: io::BufRead>(
    reader: &mut DocumentReader<R>,
    testsuite: &mut Testsuite,
) -> Result<(), DeserializeError> {
    loop {
        let (child, child_empty) = match reader.next()? {
            Event::Start(child) => (child, false),
            Event::Empty(child) => (child, true),
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(unexpected_eof(PROPERTIES_TAG)),
            _ => continue,
        };

        if child.local_name().as_ref() == PROPERTY_TAG {
            let mut name = String::new();
            let mut value = String::new();
            for (key, attr_value) in reader.attributes(&child)? {
                match key.as_str() {
                    "name" => name = attr_value,
                    "value" => value = attr_value,
                    _ => {}
                }
            }
            testsuite.add_property(Property::new(name, value));
        }
        if !child_empty {
            reader.skip_element(&child)?;
        }
    }
}

fn read_testcase<R: io::BufRead>(
    reader: &mut DocumentReader<R>,
    start: &BytesStart<'_>,
    empty: bool,
) -> Result<TestCaseRecord, DeserializeError> {
    // A missing name is kept as an empty string: the record is still reported, and consumers
    // decide what an unnamed record means.
    let mut testcase = TestCaseRecord::new("");
    for (key, value) in reader.attributes(start)? {
        match key.as_str() {
            "name" => testcase.name = value,
            "classname" => {
                testcase.set_classname(value);
            }
            "time" => {
                let time = parse_time("testcase", value, reader.position())?;
                testcase.set_time(time);
            }
            _ => {
                testcase.extra.insert(key, value);
            }
        }
    }
    if empty {
        return Ok(testcase);
    }

    loop {
        let (child, child_empty) = match reader.next()? {
            Event::Start(child) => (child, false),
            Event::Empty(child) => (child, true),
            Event::End(_) => return Ok(testcase),
            Event::Eof => return Err(unexpected_eof(TESTCASE_TAG)),
            _ => continue,
        };

        match child.local_name().as_ref() {
            tag @ (FAILURE_TAG | ERROR_TAG) => {
                let kind = if tag == FAILURE_TAG {
                    NonSuccessKind::Failure
                } else {
                    NonSuccessKind::Error
                };
                let mut failure = NonSuccess::new(kind);
                for (key, value) in reader.attributes(&child)? {
                    match key.as_str() {
                        "message" => {
                            failure.set_message(value);
                        }
                        "type" => {
                            failure.set_type(value);
                        }
                        _ => {}
                    }
                }
                if !child_empty {
                    failure.description = reader.read_text(tag)?;
                }
                // Keep the first failure if a test case somehow records several.
                if testcase.failure.is_none() {
                    testcase.set_failure(failure);
                }
            }
            SKIPPED_TAG => {
                let mut skipped = Skipped::new();
                for (key, value) in reader.attributes(&child)? {
                    if key == "message" {
                        skipped.set_message(value);
                    }
                }
                if !child_empty {
                    skipped.description = reader.read_text(SKIPPED_TAG)?;
                }
                testcase.set_skipped(skipped);
            }
            SYSTEM_OUT_TAG if !child_empty => {
                testcase.system_out = reader.read_text(SYSTEM_OUT_TAG)?.map(Output::new);
            }
            SYSTEM_ERR_TAG if !child_empty => {
                testcase.system_err = reader.read_text(SYSTEM_ERR_TAG)?.map(Output::new);
            }
            _ if child_empty => {}
            _ => reader.skip_element(&child)?,
        }
    }
}

fn parse_time(
    element: &'static str,
    value: String,
    position: usize,
) -> Result<Duration, DeserializeError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or(DeserializeError::InvalidAttribute {
            element,
            attribute: "time",
            value,
            position,
        })
}

fn unexpected_eof(element: &[u8]) -> DeserializeError {
    DeserializeError::UnexpectedEof {
        element: String::from_utf8_lossy(element).into_owned(),
    }
}

struct DocumentReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: io::BufRead> DocumentReader<R> {
    fn new(reader: R) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
        }
    }

    fn position(&self) -> usize {
        self.reader.buffer_position()
    }

    fn next(&mut self) -> Result<Event<'static>, DeserializeError> {
        self.buf.clear();
        match self.reader.read_event_into(&mut self.buf) {
            Ok(event) => Ok(event.into_owned()),
            Err(error) => Err(DeserializeError::from_xml(
                error,
                self.reader.buffer_position(),
            )),
        }
    }

    fn attributes(
        &self,
        start: &BytesStart<'_>,
    ) -> Result<Vec<(String, String)>, DeserializeError> {
        start
            .attributes()
            .map(|attr| {
                let attr = attr.map_err(|error| {
                    DeserializeError::from_xml(quick_xml::Error::from(error), self.position())
                })?;
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map_err(|error| DeserializeError::from_xml(error, self.position()))?
                    .into_owned();
                Ok((key, value))
            })
            .collect()
    }

    /// Reads the text content of the current element up to and including its end tag.
    ///
    /// Returns `None` if the element has no text.
    fn read_text(&mut self, element: &[u8]) -> Result<Option<String>, DeserializeError> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::Text(t) => {
                    let unescaped = t
                        .unescape()
                        .map_err(|error| DeserializeError::from_xml(error, self.position()))?;
                    text.push_str(&unescaped);
                }
                Event::CData(cdata) => {
                    text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
                Event::Start(child) => self.skip_element(&child)?,
                Event::End(_) => break,
                Event::Eof => return Err(unexpected_eof(element)),
                _ => {}
            }
        }

        Ok((!text.is_empty()).then_some(text))
    }

    /// Skips over an element that isn't interesting, including all of its children.
    fn skip_element(&mut self, start: &BytesStart<'_>) -> Result<(), DeserializeError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth -= 1,
                Event::Eof => return Err(unexpected_eof(start.local_name().as_ref())),
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn bare_testsuite_root() {
        let document = JunitDocument::deserialize_str(indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <testsuite name="Kubernetes e2e suite" tests="3" failures="1" time="12.5">
                <testcase name="[sig-apps] passes" classname="Kubernetes e2e suite" time="1.25"></testcase>
                <testcase name="[sig-node] fails" classname="Kubernetes e2e suite" time="2">
                    <failure type="Failure">expected &lt;true&gt;</failure>
                    <system-out>some output</system-out>
                </testcase>
                <testcase name="[sig-storage] skipped" classname="Kubernetes e2e suite" time="0">
                    <skipped></skipped>
                </testcase>
            </testsuite>
        "#})
        .expect("document is valid");

        assert_eq!(document.name, None);
        assert_eq!(document.testsuites.len(), 1);
        let testsuite = &document.testsuites[0];
        assert_eq!(testsuite.name, "Kubernetes e2e suite");
        assert_eq!(testsuite.time, Some(Duration::from_millis(12_500)));
        assert_eq!(testsuite.extra.get("failures").map(String::as_str), Some("1"));

        let testcases = &testsuite.testcases;
        assert_eq!(testcases.len(), 3);

        assert_eq!(testcases[0].name, "[sig-apps] passes");
        assert_eq!(testcases[0].time, Some(Duration::from_millis(1250)));
        assert!(!testcases[0].is_failed());
        assert!(!testcases[0].is_skipped());

        let failure = testcases[1].failure.as_ref().expect("failure is recorded");
        assert_eq!(failure.kind, NonSuccessKind::Failure);
        assert_eq!(failure.ty.as_deref(), Some("Failure"));
        assert_eq!(failure.description.as_deref(), Some("expected <true>"));
        assert_eq!(
            testcases[1].system_out.as_ref().map(Output::as_str),
            Some("some output")
        );

        assert!(testcases[2].is_skipped());
        assert_eq!(testcases[2].skipped, Some(Skipped::new()));
    }

    #[test]
    fn testsuites_root_with_properties_and_unknown_elements() {
        let document = JunitDocument::deserialize_str(indoc! {r#"
            <testsuites name="run">
                <testsuite name="one">
                    <properties>
                        <property name="env" value="ci"/>
                    </properties>
                    <custom><nested>ignored</nested></custom>
                    <testcase name="a"/>
                    <testcase name="b">
                        <error message="boom"><![CDATA[stack <trace>]]></error>
                        <skipped message="also skipped"/>
                    </testcase>
                </testsuite>
                <testsuite name="two"/>
            </testsuites>
        "#})
        .expect("document is valid");

        assert_eq!(document.name.as_deref(), Some("run"));
        assert_eq!(document.testsuites.len(), 2);
        assert_eq!(
            document.testsuites[0].properties,
            vec![Property::new("env", "ci")]
        );
        assert!(document.testsuites[1].testcases.is_empty());

        let testcases: Vec<_> = document.testcases().collect();
        assert_eq!(testcases.len(), 2);
        assert_eq!(testcases[0].name, "a");

        let failure = testcases[1].failure.as_ref().expect("error is recorded");
        assert_eq!(failure.kind, NonSuccessKind::Error);
        assert_eq!(failure.message.as_deref(), Some("boom"));
        assert_eq!(failure.description.as_deref(), Some("stack <trace>"));
        assert_eq!(
            testcases[1]
                .skipped
                .as_ref()
                .and_then(|s| s.message.as_deref()),
            Some("also skipped")
        );
    }

    #[test]
    fn missing_name_is_kept_empty() {
        let document =
            JunitDocument::deserialize_str(r#"<testsuite><testcase classname="x"/></testsuite>"#)
                .expect("document is valid");
        let testcases = document.into_testcases();
        assert_eq!(testcases.len(), 1);
        assert_eq!(testcases[0].name, "");
        assert_eq!(testcases[0].classname.as_deref(), Some("x"));
    }

    #[test_case("" ; "empty input")]
    #[test_case("<?xml version=\"1.0\"?><!-- nothing -->" ; "declaration only")]
    fn missing_root(input: &str) {
        let error = JunitDocument::deserialize_str(input).expect_err("no root element");
        assert!(
            matches!(error, DeserializeError::MissingRoot),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn unexpected_root() {
        let error = JunitDocument::deserialize_str("<html></html>").expect_err("wrong root");
        assert!(
            matches!(&error, DeserializeError::UnexpectedRoot { name, .. } if name == "html"),
            "unexpected error: {error:?}"
        );
    }

    #[test_case("<testsuite><testcase name=\"a\">" ; "inside testcase")]
    #[test_case("<testsuites><testsuite>" ; "inside testsuite")]
    #[test_case("<testsuite><testcase name=\"a\"><failure>text" ; "inside failure")]
    fn truncated_document(input: &str) {
        let error = JunitDocument::deserialize_str(input).expect_err("document is truncated");
        assert!(
            matches!(
                error,
                DeserializeError::UnexpectedEof { .. } | DeserializeError::Xml { .. }
            ),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn invalid_time() {
        let xml = r#"<testsuite><testcase name="a" time="soon"/></testsuite>"#;
        let error = JunitDocument::deserialize_str(xml).expect_err("time is invalid");
        assert!(
            matches!(
                &error,
                DeserializeError::InvalidAttribute {
                    attribute: "time",
                    value,
                    ..
                } if value == "soon"
            ),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn reader_errors_are_preserved() {
        struct FailingReader;

        impl io::Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }

        let error = JunitDocument::deserialize(io::BufReader::new(FailingReader))
            .expect_err("reader fails");
        let io_error = error.as_io().expect("error is an I/O error");
        assert_eq!(io_error.kind(), io::ErrorKind::ConnectionReset);
    }
}
