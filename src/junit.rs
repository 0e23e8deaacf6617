//! JUnit report parsing.
//!
//! Reports look like:
//!
//! ```xml
//! <testsuite tests="3" failures="1">
//!     <testcase name="First" time="0"><skipped/></testcase>
//!     <testcase name="Second" time="36.49"/>
//!     <testcase name="Third" time="96.49">
//!         <failure>/go/src/k8s.io/kubernetes/test/example.go:123
//! Error Goes Here</failure>
//!     </testcase>
//! </testsuite>
//! ```
//!
//! Test cases are read from directly under the root element, or from each
//! `<testsuite>` of a `<testsuites>` root. Inside a test case only
//! `<failure>` and `<skipped>` children mean anything; other children are
//! ignored. Reports come from CI jobs we do not control, so entity
//! declarations are refused outright.
//!
//! Text and attribute values are decoded in the encoding named by the XML
//! declaration (UTF-8 when there is none).

use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};

use crate::types::FailureRecord;
use crate::{HuginnError, Result};

/// How a single test case ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    /// Skipped, with the `<skipped>` body if it had one.
    Skipped(Option<String>),
    /// Failed, with the `<failure>` body if it had one.
    Failed(Option<String>),
}

/// One `<testcase>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    /// Duration in seconds.
    pub duration: f64,
    pub outcome: Outcome,
}

impl TestCase {
    /// The failure record for this case, if it failed.
    pub fn into_failure(self) -> Option<FailureRecord> {
        match self.outcome {
            Outcome::Failed(detail) => Some(FailureRecord::new(self.name, self.duration, detail)),
            _ => None,
        }
    }
}

/// Parse every test case in a report, in document order.
pub fn parse_report(xml: &[u8]) -> Result<Vec<TestCase>> {
    let mut reader = Reader::from_reader(xml);
    let mut parser = ReportParser::default();

    loop {
        let decoder = reader.decoder();
        match reader.read_event()? {
            Event::Start(e) => parser.start(&e, false, decoder)?,
            Event::Empty(e) => parser.start(&e, true, decoder)?,
            Event::End(_) => parser.end(),
            Event::Text(t) => {
                if let Some(buf) = parser.capture() {
                    buf.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(buf) = parser.capture() {
                    buf.push_str(&decoder.decode(&c).map_err(quick_xml::Error::from)?);
                }
            }
            Event::DocType(d) => {
                if String::from_utf8_lossy(&d).contains("ENTITY") {
                    return Err(HuginnError::MalformedReport(
                        "entity declarations are not allowed".into(),
                    ));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    parser.finish()
}

/// Parse a report and keep only the failed test cases.
///
/// Skipped tests are dropped along with passing ones.
pub fn parse_failures(xml: &[u8]) -> Result<Vec<FailureRecord>> {
    Ok(parse_report(xml)?
        .into_iter()
        .filter_map(TestCase::into_failure)
        .collect())
}

#[derive(Debug, Clone, Copy)]
enum Marker {
    Failure,
    Skipped,
}

struct OpenCase {
    name: String,
    duration: f64,
    /// Nesting depth of the `<testcase>` element itself.
    depth: usize,
    failure: Option<Option<String>>,
    skipped: Option<Option<String>>,
    capture: Option<(Marker, String)>,
}

impl OpenCase {
    fn from_element(e: &BytesStart<'_>, depth: usize, decoder: Decoder) -> Result<Self> {
        let mut name = None;
        let mut time = None;
        for attr in e.attributes() {
            let attr = attr?;
            match attr.key.local_name().as_ref() {
                b"name" => name = Some(attr.decode_and_unescape_value(decoder)?.into_owned()),
                b"time" => time = Some(attr.decode_and_unescape_value(decoder)?.into_owned()),
                _ => {}
            }
        }

        let name = name.ok_or_else(|| {
            HuginnError::MalformedReport("testcase without a name attribute".into())
        })?;
        let time = time.ok_or_else(|| {
            HuginnError::MalformedReport(format!("testcase '{name}' has no time attribute"))
        })?;
        let duration = time.trim().parse::<f64>().map_err(|_| {
            HuginnError::MalformedReport(format!("testcase '{name}' has invalid time '{time}'"))
        })?;

        Ok(Self {
            name,
            duration,
            depth,
            failure: None,
            skipped: None,
            capture: None,
        })
    }

    fn record(&mut self, marker: Marker, text: String) {
        let text = Some(text).filter(|t| !t.is_empty());
        match marker {
            Marker::Failure => self.failure = Some(text),
            Marker::Skipped => self.skipped = Some(text),
        }
    }

    fn finish(self) -> TestCase {
        let outcome = match (self.failure, self.skipped) {
            (Some(text), _) => Outcome::Failed(text),
            (None, Some(text)) => Outcome::Skipped(text),
            (None, None) => Outcome::Passed,
        };
        TestCase {
            name: self.name,
            duration: self.duration,
            outcome,
        }
    }
}

#[derive(Default)]
struct ReportParser {
    /// Local names of the currently open elements.
    stack: Vec<Vec<u8>>,
    current: Option<OpenCase>,
    cases: Vec<TestCase>,
    seen_root: bool,
}

impl ReportParser {
    fn start(&mut self, e: &BytesStart<'_>, empty: bool, decoder: Decoder) -> Result<()> {
        let depth = self.stack.len();
        let local = e.local_name();
        let name = local.as_ref();
        if depth == 0 {
            if self.seen_root {
                return Err(HuginnError::MalformedReport(
                    "multiple root elements".into(),
                ));
            }
            self.seen_root = true;
        }

        if let Some(case) = self.current.as_mut() {
            if depth == case.depth + 1 {
                let marker = match name {
                    b"failure" => Some(Marker::Failure),
                    b"skipped" => Some(Marker::Skipped),
                    _ => None,
                };
                if let Some(marker) = marker {
                    if empty {
                        case.record(marker, String::new());
                    } else {
                        case.capture = Some((marker, String::new()));
                    }
                }
            }
        } else if name == b"testcase" && self.in_suite(depth) {
            let case = OpenCase::from_element(e, depth, decoder)?;
            if empty {
                self.cases.push(case.finish());
            } else {
                self.current = Some(case);
            }
        }

        if !empty {
            self.stack.push(name.to_vec());
        }
        Ok(())
    }

    fn end(&mut self) {
        self.stack.pop();
        let depth = self.stack.len();
        let Some(case) = self.current.as_mut() else {
            return;
        };

        if depth == case.depth + 1 {
            if let Some((marker, text)) = case.capture.take() {
                case.record(marker, text);
            }
        } else if depth == case.depth {
            if let Some(case) = self.current.take() {
                self.cases.push(case.finish());
            }
        }
    }

    fn capture(&mut self) -> Option<&mut String> {
        self.current
            .as_mut()
            .and_then(|c| c.capture.as_mut())
            .map(|(_, buf)| buf)
    }

    /// Whether an element at `depth` sits where test cases live.
    fn in_suite(&self, depth: usize) -> bool {
        match depth {
            1 => true,
            2 => self.stack[0] == b"testsuites" && self.stack[1] == b"testsuite",
            _ => false,
        }
    }

    fn finish(self) -> Result<Vec<TestCase>> {
        if !self.seen_root {
            return Err(HuginnError::MalformedReport(
                "document has no root element".into(),
            ));
        }
        if !self.stack.is_empty() {
            return Err(HuginnError::MalformedReport(
                "unexpected end of document".into(),
            ));
        }
        Ok(self.cases)
    }
}
