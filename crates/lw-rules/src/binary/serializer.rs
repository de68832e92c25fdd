//! AST → bytes.

use super::format::*;
use super::frequent;
use super::SerializeError;
use crate::ast::{
    Agent, CommentRule, ConfigParams, CosmeticBody, CosmeticRule, Domain, Hint, HostRule,
    InvalidRule, LogicalExpression, Modifier, ModifierList, NetworkRule, PreProcessorParams,
    RuleNode, ScriptletCall, Span,
};
use crate::syntax::AdblockSyntax;

/// Encode nodes with the binary header.
pub fn serialize_rules(nodes: &[RuleNode]) -> Result<Vec<u8>, SerializeError> {
    let count = u32::try_from(nodes.len()).map_err(|_| SerializeError::TooManyItems {
        field: "nodes",
        count: nodes.len(),
        max: u32::MAX as usize,
    })?;

    let mut writer = Writer::default();
    writer.buf.extend_from_slice(&BINARY_MAGIC);
    writer.buf.extend_from_slice(&BINARY_SCHEMA_VERSION.to_le_bytes());
    writer.buf.extend_from_slice(&count.to_le_bytes());
    debug_assert_eq!(writer.buf.len(), HEADER_SIZE);

    for node in nodes {
        writer.node(node)?;
    }
    Ok(writer.buf)
}

/// Encode a single node with the binary header.
pub fn serialize_rule(node: &RuleNode) -> Result<Vec<u8>, SerializeError> {
    serialize_rules(std::slice::from_ref(node))
}

/// Append a LEB128 varint.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        } else {
            buf.push(byte | 0x80);
        }
    }
}

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    // =========================================================================
    // Primitives
    // =========================================================================

    fn tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    fn string(&mut self, value: &str) -> Result<(), SerializeError> {
        let len = u32::try_from(value.len()).map_err(|_| SerializeError::StringTooLong(value.len()))?;
        encode_varint(&mut self.buf, len);
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn string_field(&mut self, tag: u8, value: &str) -> Result<(), SerializeError> {
        self.tag(tag);
        self.string(value)
    }

    fn value(&mut self, value: &str, table: &[&str]) -> Result<(), SerializeError> {
        match frequent::lookup(table, value) {
            Some(index) => {
                self.buf.push(VALUE_FREQUENT);
                self.buf.push(index);
                Ok(())
            }
            None => {
                self.buf.push(VALUE_STRING);
                self.string(value)
            }
        }
    }

    fn value_field(&mut self, tag: u8, value: &str, table: &[&str]) -> Result<(), SerializeError> {
        self.tag(tag);
        self.value(value, table)
    }

    fn flag(&mut self, tag: u8, set: bool) {
        if set {
            self.tag(tag);
        }
    }

    fn syntax(&mut self, tag: u8, syntax: AdblockSyntax) {
        if syntax != AdblockSyntax::Common {
            self.tag(tag);
            self.buf.push(syntax as u8);
        }
    }

    fn count_u8(&mut self, field: &'static str, count: usize) -> Result<(), SerializeError> {
        let value = u8::try_from(count).map_err(|_| SerializeError::TooManyItems {
            field,
            count,
            max: u8::MAX as usize,
        })?;
        self.buf.push(value);
        Ok(())
    }

    fn count_u16(&mut self, field: &'static str, count: usize) -> Result<(), SerializeError> {
        let value = u16::try_from(count).map_err(|_| SerializeError::TooManyItems {
            field,
            count,
            max: u16::MAX as usize,
        })?;
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn span(&mut self, span: Option<Span>) {
        if let Some(span) = span {
            self.tag(location::START);
            encode_varint(&mut self.buf, span.start);
            self.tag(location::END);
            encode_varint(&mut self.buf, span.end);
        }
    }

    fn begin(&mut self, node: NodeType) {
        self.buf.push(node as u8);
    }

    fn end(&mut self) {
        self.buf.push(NULL);
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    fn node(&mut self, node: &RuleNode) -> Result<(), SerializeError> {
        match node {
            RuleNode::Empty(rule) => {
                self.begin(NodeType::Empty);
                self.span(rule.span);
                self.end();
                Ok(())
            }
            RuleNode::Invalid(rule) => self.invalid(rule),
            RuleNode::Comment(rule) => self.comment(rule),
            RuleNode::Cosmetic(rule) => self.cosmetic(rule),
            RuleNode::Network(rule) => self.network(rule),
            RuleNode::Host(rule) => self.host(rule),
        }
    }

    fn invalid(&mut self, rule: &InvalidRule) -> Result<(), SerializeError> {
        self.begin(NodeType::Invalid);
        self.string_field(invalid::RAW, &rule.raw)?;
        self.tag(invalid::ERROR);
        self.begin(NodeType::InvalidError);
        self.string_field(invalid_error::NAME, &rule.error.name)?;
        self.string_field(invalid_error::MESSAGE, &rule.error.message)?;
        self.span(rule.error.span);
        self.end();
        self.span(rule.span);
        self.end();
        Ok(())
    }

    fn comment(&mut self, rule: &CommentRule) -> Result<(), SerializeError> {
        match rule {
            CommentRule::Simple(rule) => {
                self.begin(NodeType::SimpleComment);
                self.tag(simple_comment::MARKER);
                self.buf.push(rule.marker as u8);
                self.string_field(simple_comment::TEXT, &rule.text)?;
                self.span(rule.span);
            }
            CommentRule::Agent(rule) => {
                self.begin(NodeType::AgentComment);
                self.tag(agent_comment::AGENTS);
                self.count_u8("agents", rule.agents.len())?;
                for agent in &rule.agents {
                    self.agent(agent)?;
                }
                self.span(rule.span);
            }
            CommentRule::Hint(rule) => {
                self.begin(NodeType::HintComment);
                self.tag(hint_comment::HINTS);
                self.count_u8("hints", rule.hints.len())?;
                for hint in &rule.hints {
                    self.hint(hint)?;
                }
                self.span(rule.span);
            }
            CommentRule::PreProcessor(rule) => {
                self.begin(NodeType::PreProcessor);
                self.value_field(preprocessor::NAME, &rule.name, frequent::PREPROCESSOR_DIRECTIVES)?;
                match &rule.params {
                    None => {}
                    Some(PreProcessorParams::Value(value)) => {
                        self.string_field(preprocessor::VALUE, value)?;
                    }
                    Some(PreProcessorParams::Parameters(params)) => {
                        self.tag(preprocessor::PARAMETERS);
                        self.count_u8("pre-processor parameters", params.len())?;
                        for param in params {
                            self.string(param)?;
                        }
                    }
                    Some(PreProcessorParams::Expression(expr)) => {
                        self.tag(preprocessor::EXPRESSION);
                        self.expression(expr)?;
                    }
                }
                self.syntax(preprocessor::SYNTAX, rule.syntax);
                self.span(rule.span);
            }
            CommentRule::Metadata(rule) => {
                self.begin(NodeType::Metadata);
                self.tag(metadata::MARKER);
                self.buf.push(rule.marker as u8);
                self.value_field(metadata::HEADER, &rule.header, frequent::METADATA_HEADERS)?;
                self.string_field(metadata::VALUE, &rule.value)?;
                self.span(rule.span);
            }
            CommentRule::Config(rule) => {
                self.begin(NodeType::Config);
                self.tag(config::MARKER);
                self.buf.push(rule.marker as u8);
                self.value_field(config::COMMAND, &rule.command, frequent::CONFIG_COMMANDS)?;
                match &rule.params {
                    None => {}
                    Some(ConfigParams::Object(object)) => {
                        let json = serde_json::Value::Object(object.clone()).to_string();
                        self.string_field(config::OBJECT, &json)?;
                    }
                    Some(ConfigParams::RuleList(rules)) => {
                        self.tag(config::RULE_LIST);
                        self.count_u8("config rules", rules.len())?;
                        for rule in rules {
                            self.string(rule)?;
                        }
                    }
                }
                if let Some(comment) = &rule.comment {
                    self.string_field(config::COMMENT, comment)?;
                }
                self.span(rule.span);
            }
        }
        self.end();
        Ok(())
    }

    fn agent(&mut self, agent: &Agent) -> Result<(), SerializeError> {
        self.begin(NodeType::Agent);
        self.value_field(agent::ADBLOCK, &agent.adblock, frequent::AGENTS)?;
        if let Some(version) = &agent.version {
            self.string_field(agent::VERSION, version)?;
        }
        self.span(agent.span);
        self.end();
        Ok(())
    }

    fn hint(&mut self, hint: &Hint) -> Result<(), SerializeError> {
        self.begin(NodeType::Hint);
        self.value_field(hint::NAME, &hint.name, frequent::HINTS)?;
        if let Some(params) = &hint.params {
            self.tag(hint::PARAMS);
            self.count_u8("hint parameters", params.len())?;
            for param in params {
                self.value(param, frequent::PLATFORMS)?;
            }
        }
        self.span(hint.span);
        self.end();
        Ok(())
    }

    fn expression(&mut self, expr: &LogicalExpression) -> Result<(), SerializeError> {
        match expr {
            LogicalExpression::Variable(name) => {
                self.begin(NodeType::ExpressionVariable);
                self.value_field(expression::NAME, name, frequent::PREPROCESSOR_VARIABLES)?;
            }
            LogicalExpression::Not(inner) => {
                self.begin(NodeType::ExpressionNot);
                self.tag(expression::LEFT);
                self.expression(inner)?;
            }
            LogicalExpression::Parenthesis(inner) => {
                self.begin(NodeType::ExpressionParenthesis);
                self.tag(expression::LEFT);
                self.expression(inner)?;
            }
            LogicalExpression::And(left, right) | LogicalExpression::Or(left, right) => {
                let node = if matches!(expr, LogicalExpression::And(..)) {
                    NodeType::ExpressionAnd
                } else {
                    NodeType::ExpressionOr
                };
                self.begin(node);
                self.tag(expression::LEFT);
                self.expression(left)?;
                self.tag(expression::RIGHT);
                self.expression(right)?;
            }
        }
        self.end();
        Ok(())
    }

    fn cosmetic(&mut self, rule: &CosmeticRule) -> Result<(), SerializeError> {
        self.begin(NodeType::Cosmetic);
        self.syntax(cosmetic::SYNTAX, rule.syntax);
        self.flag(cosmetic::EXCEPTION, rule.exception);
        self.tag(cosmetic::SEPARATOR);
        self.buf.push(rule.separator as u8);
        if let Some(modifiers) = &rule.modifiers {
            self.tag(cosmetic::MODIFIERS);
            self.modifier_list(modifiers)?;
        }
        if !rule.domains.is_empty() {
            self.tag(cosmetic::DOMAINS);
            self.count_u16("domains", rule.domains.len())?;
            for domain in &rule.domains {
                self.domain(domain)?;
            }
        }
        self.tag(cosmetic::BODY);
        self.cosmetic_body(&rule.body)?;
        self.span(rule.span);
        self.end();
        Ok(())
    }

    fn domain(&mut self, domain: &Domain) -> Result<(), SerializeError> {
        self.begin(NodeType::Domain);
        self.string_field(domain::VALUE, &domain.value)?;
        self.flag(domain::EXCEPTION, domain.exception);
        self.span(domain.span);
        self.end();
        Ok(())
    }

    fn cosmetic_body(&mut self, body: &CosmeticBody) -> Result<(), SerializeError> {
        match body {
            CosmeticBody::ElementHiding(body) => {
                self.begin(NodeType::ElementHidingBody);
                self.string_field(element_hiding_body::SELECTOR, &body.selector_list)?;
            }
            CosmeticBody::CssInjection(body) => {
                self.begin(NodeType::CssInjectionBody);
                if let Some(media) = &body.media_query_list {
                    self.string_field(css_injection_body::MEDIA, media)?;
                }
                self.string_field(css_injection_body::SELECTOR, &body.selector_list)?;
                if let Some(declarations) = &body.declaration_list {
                    self.string_field(css_injection_body::DECLARATIONS, declarations)?;
                }
                self.flag(css_injection_body::REMOVE, body.remove);
            }
            CosmeticBody::Scriptlet(body) => {
                self.begin(NodeType::ScriptletBody);
                self.tag(scriptlet_body::CALLS);
                self.count_u16("scriptlet calls", body.calls.len())?;
                for call in &body.calls {
                    self.scriptlet_call(call)?;
                }
            }
            CosmeticBody::HtmlFiltering(value) => {
                self.begin(NodeType::HtmlFilteringBody);
                self.string_field(raw_body::VALUE, value)?;
            }
            CosmeticBody::JsInjection(value) => {
                self.begin(NodeType::JsInjectionBody);
                self.string_field(raw_body::VALUE, value)?;
            }
        }
        self.end();
        Ok(())
    }

    fn scriptlet_call(&mut self, call: &ScriptletCall) -> Result<(), SerializeError> {
        self.begin(NodeType::ScriptletCall);
        self.tag(scriptlet_call::PARAMS);
        self.count_u16("scriptlet parameters", call.params.len())?;
        for param in &call.params {
            self.string(param)?;
        }
        self.end();
        Ok(())
    }

    fn network(&mut self, rule: &NetworkRule) -> Result<(), SerializeError> {
        self.begin(NodeType::NetworkRule);
        self.syntax(network_rule::SYNTAX, rule.syntax);
        self.flag(network_rule::EXCEPTION, rule.exception);
        self.string_field(network_rule::PATTERN, &rule.pattern)?;
        if let Some(modifiers) = &rule.modifiers {
            self.tag(network_rule::MODIFIERS);
            self.modifier_list(modifiers)?;
        }
        self.span(rule.span);
        self.end();
        Ok(())
    }

    fn host(&mut self, rule: &HostRule) -> Result<(), SerializeError> {
        self.begin(NodeType::HostRule);
        self.string_field(host_rule::IP, &rule.ip)?;
        self.tag(host_rule::HOSTNAMES);
        self.count_u16("hostnames", rule.hostnames.len())?;
        for hostname in &rule.hostnames {
            self.string(hostname)?;
        }
        if let Some(comment) = &rule.comment {
            self.string_field(host_rule::COMMENT, comment)?;
        }
        self.span(rule.span);
        self.end();
        Ok(())
    }

    fn modifier_list(&mut self, list: &ModifierList) -> Result<(), SerializeError> {
        self.begin(NodeType::ModifierList);
        self.tag(modifier_list::CHILDREN);
        self.count_u16("modifiers", list.children.len())?;
        for modifier in &list.children {
            self.modifier(modifier)?;
        }
        self.span(list.span);
        self.end();
        Ok(())
    }

    fn modifier(&mut self, modifier: &Modifier) -> Result<(), SerializeError> {
        self.begin(NodeType::Modifier);
        self.value_field(modifier::NAME, &modifier.name, frequent::MODIFIERS)?;
        if let Some(value) = &modifier.value {
            self.value_field(modifier::VALUE, value, frequent::REDIRECTS)?;
        }
        self.flag(modifier::EXCEPTION, modifier.exception);
        self.span(modifier.span);
        self.end();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AgentCommentRule, EmptyRule};

    #[test]
    fn varint_encoding() {
        let mut buf = Vec::new();
        encode_varint(&mut buf, 0);
        encode_varint(&mut buf, 127);
        encode_varint(&mut buf, 300);
        assert_eq!(buf, vec![0x00, 0x7F, 0xAC, 0x02]);
    }

    #[test]
    fn header_layout() {
        let bytes = serialize_rule(&RuleNode::Empty(EmptyRule { span: None })).expect("serialize");
        assert_eq!(&bytes[..4], &BINARY_MAGIC);
        assert_eq!(read_u16_le(&bytes, header::SCHEMA_VERSION), BINARY_SCHEMA_VERSION);
        assert_eq!(read_u32_le(&bytes, header::NODE_COUNT), 1);
        assert_eq!(&bytes[HEADER_SIZE..], &[NodeType::Empty as u8, NULL]);
    }

    #[test]
    fn frequent_values_use_one_byte() {
        let agent = |adblock: &str| Agent {
            adblock: adblock.to_string(),
            version: None,
            syntax: AdblockSyntax::Common,
            span: None,
        };
        let mut writer = Writer::default();
        writer.agent(&agent("AdGuard")).expect("agent");
        assert_eq!(
            writer.buf,
            vec![NodeType::Agent as u8, agent::ADBLOCK, VALUE_FREQUENT, 0, NULL]
        );

        let mut writer = Writer::default();
        writer.agent(&agent("Brave")).expect("agent");
        assert_eq!(writer.buf[2], VALUE_STRING);
        assert_eq!(&writer.buf[3..9], &[5, b'B', b'r', b'a', b'v', b'e']);
    }

    #[test]
    fn too_many_agents_is_an_error() {
        let agents = (0..256)
            .map(|i| Agent {
                adblock: format!("agent{i}"),
                version: None,
                syntax: AdblockSyntax::Common,
                span: None,
            })
            .collect();
        let node = RuleNode::Comment(CommentRule::Agent(AgentCommentRule {
            agents,
            span: None,
            raws: None,
        }));
        let err = serialize_rule(&node).expect_err("overflow");
        assert!(matches!(
            err,
            SerializeError::TooManyItems { field: "agents", count: 256, max: 255 }
        ));
    }

    #[test]
    fn too_many_modifiers_is_an_error() {
        let children = (0..70_000).map(|_| Modifier::new("script", None, false)).collect();
        let node = RuleNode::Network(NetworkRule {
            syntax: AdblockSyntax::Common,
            exception: false,
            pattern: String::new(),
            modifiers: Some(ModifierList::new(children)),
            span: None,
            raws: None,
        });
        let err = serialize_rule(&node).expect_err("overflow");
        assert!(matches!(err, SerializeError::TooManyItems { field: "modifiers", .. }));
    }
}
