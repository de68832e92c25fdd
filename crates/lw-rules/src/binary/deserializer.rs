//! Bytes → AST.

use super::format::*;
use super::frequent;
use super::DeserializeError;
use crate::ast::{
    Agent, AgentCommentRule, CommentRule, ConfigCommentRule, ConfigParams, CosmeticBody,
    CosmeticRule, CssInjectionBody, Domain, ElementHidingBody, EmptyRule, Hint, HintCommentRule,
    HostRule, InvalidRule, InvalidRuleError, LogicalExpression, MetadataCommentRule, Modifier,
    ModifierList, NetworkRule, PreProcessorCommentRule, PreProcessorParams, RuleNode,
    ScriptletBody, ScriptletCall, SimpleCommentRule, Span,
};
use crate::syntax::{syntax_from_agent_name, AdblockSyntax, CommentMarker, CosmeticSeparator};

/// Header of an encoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryInfo {
    pub schema_version: u16,
    pub node_count: u32,
    pub byte_len: usize,
}

/// Validate the header and return its fields.
///
/// The schema version is checked before anything else is interpreted.
pub fn read_header(data: &[u8]) -> Result<BinaryInfo, DeserializeError> {
    if data.len() < HEADER_SIZE {
        return Err(DeserializeError::UnexpectedEof(data.len()));
    }
    if !validate_magic(data) {
        return Err(DeserializeError::InvalidMagic);
    }
    let schema_version = read_u16_le(data, header::SCHEMA_VERSION);
    if schema_version != BINARY_SCHEMA_VERSION {
        return Err(DeserializeError::SchemaMismatch {
            expected: BINARY_SCHEMA_VERSION,
            found: schema_version,
        });
    }
    Ok(BinaryInfo {
        schema_version,
        node_count: read_u32_le(data, header::NODE_COUNT),
        byte_len: data.len(),
    })
}

/// Decode every node of a buffer produced by `serialize_rules`.
pub fn deserialize_rules(data: &[u8]) -> Result<Vec<RuleNode>, DeserializeError> {
    let info = read_header(data)?;
    let mut reader = Reader {
        data,
        pos: HEADER_SIZE,
    };
    let mut nodes = Vec::with_capacity((info.node_count as usize).min(data.len()));
    for _ in 0..info.node_count {
        nodes.push(reader.rule_node()?);
    }
    if reader.pos != data.len() {
        return Err(DeserializeError::TrailingBytes(data.len() - reader.pos));
    }
    Ok(nodes)
}

/// Decode a buffer holding exactly one node.
pub fn deserialize_rule(data: &[u8]) -> Result<RuleNode, DeserializeError> {
    let mut nodes = deserialize_rules(data)?;
    if nodes.len() != 1 {
        return Err(DeserializeError::InvalidValue(format!(
            "expected exactly one node, found {}",
            nodes.len()
        )));
    }
    nodes
        .pop()
        .ok_or_else(|| DeserializeError::InvalidValue("expected exactly one node".into()))
}

/// Decode a LEB128 varint at `offset`. Returns the value and bytes consumed.
pub fn decode_varint(data: &[u8], offset: usize) -> (u32, usize) {
    let mut result: u32 = 0;
    let mut shift = 0;
    let mut bytes_read = 0;

    while offset + bytes_read < data.len() {
        let byte = data[offset + bytes_read];
        bytes_read += 1;

        result |= ((byte & 0x7f) as u32) << shift;

        if byte & 0x80 == 0 {
            break;
        }

        shift += 7;
        if shift > 28 {
            break;
        }
    }

    (result, bytes_read)
}

#[derive(Default)]
struct SpanFields {
    start: Option<u32>,
    end: Option<u32>,
}

impl SpanFields {
    fn finish(self) -> Option<Span> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(Span { start, end }),
            _ => None,
        }
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    // =========================================================================
    // Primitives
    // =========================================================================

    fn u8(&mut self) -> Result<u8, DeserializeError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(DeserializeError::UnexpectedEof(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    fn u16(&mut self) -> Result<u16, DeserializeError> {
        if self.pos + 2 > self.data.len() {
            return Err(DeserializeError::UnexpectedEof(self.pos));
        }
        let value = read_u16_le(self.data, self.pos);
        self.pos += 2;
        Ok(value)
    }

    fn varint(&mut self) -> Result<u32, DeserializeError> {
        let (value, read) = decode_varint(self.data, self.pos);
        if read == 0 || self.data[self.pos + read - 1] & 0x80 != 0 {
            return Err(DeserializeError::UnexpectedEof(self.pos + read));
        }
        self.pos += read;
        Ok(value)
    }

    fn string(&mut self) -> Result<String, DeserializeError> {
        let len = self.varint()? as usize;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(DeserializeError::UnexpectedEof(self.data.len()))?;
        let text = std::str::from_utf8(&self.data[self.pos..end])
            .map_err(|_| DeserializeError::InvalidUtf8(self.pos))?;
        self.pos = end;
        Ok(text.to_string())
    }

    fn value(&mut self, table: &[&str]) -> Result<String, DeserializeError> {
        match self.u8()? {
            VALUE_STRING => self.string(),
            VALUE_FREQUENT => {
                let index = self.u8()?;
                table
                    .get(index as usize)
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        DeserializeError::InvalidValue(format!("frequent value index {index} out of range"))
                    })
            }
            marker => Err(DeserializeError::InvalidValue(format!(
                "unknown value marker {marker}"
            ))),
        }
    }

    fn marker(&mut self) -> Result<CommentMarker, DeserializeError> {
        let raw = self.u8()?;
        CommentMarker::try_from(raw)
            .map_err(|_| DeserializeError::InvalidValue(format!("unknown comment marker {raw}")))
    }

    fn syntax(&mut self) -> Result<AdblockSyntax, DeserializeError> {
        let raw = self.u8()?;
        AdblockSyntax::try_from(raw)
            .map_err(|_| DeserializeError::InvalidValue(format!("unknown syntax {raw}")))
    }

    fn node_type(&mut self) -> Result<NodeType, DeserializeError> {
        let offset = self.pos;
        let raw = self.u8()?;
        NodeType::try_from(raw).map_err(|_| DeserializeError::UnknownNodeType { tag: raw, offset })
    }

    fn expect(&mut self, expected: NodeType) -> Result<(), DeserializeError> {
        let offset = self.pos;
        let found = self.node_type()?;
        if found != expected {
            return Err(DeserializeError::UnexpectedNodeType {
                expected: expected.name(),
                found: found.name(),
                offset,
            });
        }
        Ok(())
    }

    /// Handle a location tag. Returns `false` for any other tag.
    fn location(&mut self, tag: u8, span: &mut SpanFields) -> Result<bool, DeserializeError> {
        match tag {
            location::START => span.start = Some(self.varint()?),
            location::END => span.end = Some(self.varint()?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn unknown(node: NodeType, tag: u8) -> DeserializeError {
        DeserializeError::UnknownField {
            node: node.name(),
            tag,
        }
    }

    fn missing(node: NodeType, field: &'static str) -> DeserializeError {
        DeserializeError::MissingField {
            node: node.name(),
            field,
        }
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    fn rule_node(&mut self) -> Result<RuleNode, DeserializeError> {
        let offset = self.pos;
        match self.node_type()? {
            NodeType::Empty => {
                let mut span = SpanFields::default();
                loop {
                    let tag = self.u8()?;
                    if tag == NULL {
                        break;
                    }
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NodeType::Empty, tag));
                    }
                }
                Ok(RuleNode::Empty(EmptyRule { span: span.finish() }))
            }
            NodeType::Invalid => self.invalid().map(RuleNode::Invalid),
            NodeType::SimpleComment => self.simple_comment().map(RuleNode::Comment),
            NodeType::AgentComment => self.agent_comment().map(RuleNode::Comment),
            NodeType::HintComment => self.hint_comment().map(RuleNode::Comment),
            NodeType::PreProcessor => self.preprocessor().map(RuleNode::Comment),
            NodeType::Metadata => self.metadata().map(RuleNode::Comment),
            NodeType::Config => self.config().map(RuleNode::Comment),
            NodeType::Cosmetic => self.cosmetic().map(RuleNode::Cosmetic),
            NodeType::NetworkRule => self.network().map(RuleNode::Network),
            NodeType::HostRule => self.host().map(RuleNode::Host),
            other => Err(DeserializeError::UnexpectedNodeType {
                expected: "rule node",
                found: other.name(),
                offset,
            }),
        }
    }

    fn invalid(&mut self) -> Result<InvalidRule, DeserializeError> {
        const NODE: NodeType = NodeType::Invalid;
        let mut raw = None;
        let mut error = None;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                invalid::RAW => raw = Some(self.string()?),
                invalid::ERROR => error = Some(self.invalid_error()?),
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(InvalidRule {
            raw: raw.ok_or_else(|| Self::missing(NODE, "raw"))?,
            error: error.ok_or_else(|| Self::missing(NODE, "error"))?,
            span: span.finish(),
        })
    }

    fn invalid_error(&mut self) -> Result<InvalidRuleError, DeserializeError> {
        const NODE: NodeType = NodeType::InvalidError;
        self.expect(NODE)?;
        let mut name = None;
        let mut message = None;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                invalid_error::NAME => name = Some(self.string()?),
                invalid_error::MESSAGE => message = Some(self.string()?),
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(InvalidRuleError {
            name: name.ok_or_else(|| Self::missing(NODE, "name"))?,
            message: message.ok_or_else(|| Self::missing(NODE, "message"))?,
            span: span.finish(),
        })
    }

    fn simple_comment(&mut self) -> Result<CommentRule, DeserializeError> {
        const NODE: NodeType = NodeType::SimpleComment;
        let mut marker = CommentMarker::default();
        let mut text = String::new();
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                simple_comment::MARKER => marker = self.marker()?,
                simple_comment::TEXT => text = self.string()?,
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(CommentRule::Simple(SimpleCommentRule {
            marker,
            text,
            span: span.finish(),
            raws: None,
        }))
    }

    fn agent_comment(&mut self) -> Result<CommentRule, DeserializeError> {
        const NODE: NodeType = NodeType::AgentComment;
        let mut agents = Vec::new();
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                agent_comment::AGENTS => {
                    let count = self.u8()?;
                    agents = (0..count).map(|_| self.agent()).collect::<Result<_, _>>()?;
                }
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(CommentRule::Agent(AgentCommentRule {
            agents,
            span: span.finish(),
            raws: None,
        }))
    }

    fn agent(&mut self) -> Result<Agent, DeserializeError> {
        const NODE: NodeType = NodeType::Agent;
        self.expect(NODE)?;
        let mut adblock = None;
        let mut version = None;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                agent::ADBLOCK => adblock = Some(self.value(frequent::AGENTS)?),
                agent::VERSION => version = Some(self.string()?),
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        let adblock = adblock.ok_or_else(|| Self::missing(NODE, "adblock"))?;
        Ok(Agent {
            syntax: syntax_from_agent_name(&adblock),
            adblock,
            version,
            span: span.finish(),
        })
    }

    fn hint_comment(&mut self) -> Result<CommentRule, DeserializeError> {
        const NODE: NodeType = NodeType::HintComment;
        let mut hints = Vec::new();
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                hint_comment::HINTS => {
                    let count = self.u8()?;
                    hints = (0..count).map(|_| self.hint()).collect::<Result<_, _>>()?;
                }
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(CommentRule::Hint(HintCommentRule {
            hints,
            span: span.finish(),
            raws: None,
        }))
    }

    fn hint(&mut self) -> Result<Hint, DeserializeError> {
        const NODE: NodeType = NodeType::Hint;
        self.expect(NODE)?;
        let mut name = None;
        let mut params = None;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                hint::NAME => name = Some(self.value(frequent::HINTS)?),
                hint::PARAMS => {
                    let count = self.u8()?;
                    params = Some(
                        (0..count)
                            .map(|_| self.value(frequent::PLATFORMS))
                            .collect::<Result<_, _>>()?,
                    );
                }
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(Hint {
            name: name.ok_or_else(|| Self::missing(NODE, "name"))?,
            params,
            span: span.finish(),
        })
    }

    fn preprocessor(&mut self) -> Result<CommentRule, DeserializeError> {
        const NODE: NodeType = NodeType::PreProcessor;
        let mut name = None;
        let mut params = None;
        let mut syntax = AdblockSyntax::Common;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                preprocessor::NAME => name = Some(self.value(frequent::PREPROCESSOR_DIRECTIVES)?),
                preprocessor::VALUE => params = Some(PreProcessorParams::Value(self.string()?)),
                preprocessor::PARAMETERS => {
                    let count = self.u8()?;
                    let list = (0..count).map(|_| self.string()).collect::<Result<_, _>>()?;
                    params = Some(PreProcessorParams::Parameters(list));
                }
                preprocessor::EXPRESSION => {
                    params = Some(PreProcessorParams::Expression(self.expression()?));
                }
                preprocessor::SYNTAX => syntax = self.syntax()?,
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(CommentRule::PreProcessor(PreProcessorCommentRule {
            name: name.ok_or_else(|| Self::missing(NODE, "name"))?,
            params,
            syntax,
            span: span.finish(),
            raws: None,
        }))
    }

    fn expression(&mut self) -> Result<LogicalExpression, DeserializeError> {
        let node = self.node_type()?;
        let mut name = None;
        let mut left = None;
        let mut right = None;
        loop {
            match (node, self.u8()?) {
                (_, NULL) => break,
                (NodeType::ExpressionVariable, expression::NAME) => {
                    name = Some(self.value(frequent::PREPROCESSOR_VARIABLES)?);
                }
                (
                    NodeType::ExpressionNot
                    | NodeType::ExpressionParenthesis
                    | NodeType::ExpressionAnd
                    | NodeType::ExpressionOr,
                    expression::LEFT,
                ) => left = Some(Box::new(self.expression()?)),
                (NodeType::ExpressionAnd | NodeType::ExpressionOr, expression::RIGHT) => {
                    right = Some(Box::new(self.expression()?));
                }
                (node, tag) => return Err(Self::unknown(node, tag)),
            }
        }
        let operand = |side: Option<Box<LogicalExpression>>, field: &'static str| {
            side.ok_or_else(|| Self::missing(node, field))
        };
        match node {
            NodeType::ExpressionVariable => Ok(LogicalExpression::Variable(
                name.ok_or_else(|| Self::missing(node, "name"))?,
            )),
            NodeType::ExpressionNot => Ok(LogicalExpression::Not(operand(left, "left")?)),
            NodeType::ExpressionParenthesis => {
                Ok(LogicalExpression::Parenthesis(operand(left, "left")?))
            }
            NodeType::ExpressionAnd => Ok(LogicalExpression::And(
                operand(left, "left")?,
                operand(right, "right")?,
            )),
            NodeType::ExpressionOr => Ok(LogicalExpression::Or(
                operand(left, "left")?,
                operand(right, "right")?,
            )),
            other => Err(DeserializeError::UnexpectedNodeType {
                expected: "expression",
                found: other.name(),
                offset: self.pos,
            }),
        }
    }

    fn metadata(&mut self) -> Result<CommentRule, DeserializeError> {
        const NODE: NodeType = NodeType::Metadata;
        let mut marker = CommentMarker::default();
        let mut header = None;
        let mut value = None;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                metadata::MARKER => marker = self.marker()?,
                metadata::HEADER => header = Some(self.value(frequent::METADATA_HEADERS)?),
                metadata::VALUE => value = Some(self.string()?),
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(CommentRule::Metadata(MetadataCommentRule {
            marker,
            header: header.ok_or_else(|| Self::missing(NODE, "header"))?,
            value: value.ok_or_else(|| Self::missing(NODE, "value"))?,
            span: span.finish(),
            raws: None,
        }))
    }

    fn config(&mut self) -> Result<CommentRule, DeserializeError> {
        const NODE: NodeType = NodeType::Config;
        let mut marker = CommentMarker::default();
        let mut command = None;
        let mut params = None;
        let mut comment = None;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                config::MARKER => marker = self.marker()?,
                config::COMMAND => command = Some(self.value(frequent::CONFIG_COMMANDS)?),
                config::OBJECT => {
                    let json = self.string()?;
                    let object = serde_json::from_str(&json).map_err(|e| {
                        DeserializeError::InvalidValue(format!("invalid config object: {e}"))
                    })?;
                    params = Some(ConfigParams::Object(object));
                }
                config::RULE_LIST => {
                    let count = self.u8()?;
                    let rules = (0..count).map(|_| self.string()).collect::<Result<_, _>>()?;
                    params = Some(ConfigParams::RuleList(rules));
                }
                config::COMMENT => comment = Some(self.string()?),
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(CommentRule::Config(ConfigCommentRule {
            marker,
            command: command.ok_or_else(|| Self::missing(NODE, "command"))?,
            params,
            comment,
            span: span.finish(),
            raws: None,
        }))
    }

    fn cosmetic(&mut self) -> Result<CosmeticRule, DeserializeError> {
        const NODE: NodeType = NodeType::Cosmetic;
        let mut syntax = AdblockSyntax::Common;
        let mut exception = false;
        let mut separator = None;
        let mut modifiers = None;
        let mut domains = Vec::new();
        let mut body = None;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                cosmetic::SYNTAX => syntax = self.syntax()?,
                cosmetic::EXCEPTION => exception = true,
                cosmetic::SEPARATOR => {
                    let raw = self.u8()?;
                    separator = Some(CosmeticSeparator::try_from(raw).map_err(|_| {
                        DeserializeError::InvalidValue(format!("unknown cosmetic separator {raw}"))
                    })?);
                }
                cosmetic::MODIFIERS => modifiers = Some(self.modifier_list()?),
                cosmetic::DOMAINS => {
                    let count = self.u16()?;
                    domains = (0..count).map(|_| self.domain()).collect::<Result<_, _>>()?;
                }
                cosmetic::BODY => body = Some(self.cosmetic_body()?),
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(CosmeticRule {
            syntax,
            exception,
            modifiers,
            domains,
            separator: separator.ok_or_else(|| Self::missing(NODE, "separator"))?,
            body: body.ok_or_else(|| Self::missing(NODE, "body"))?,
            span: span.finish(),
            raws: None,
        })
    }

    fn domain(&mut self) -> Result<Domain, DeserializeError> {
        const NODE: NodeType = NodeType::Domain;
        self.expect(NODE)?;
        let mut value = None;
        let mut exception = false;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                domain::VALUE => value = Some(self.string()?),
                domain::EXCEPTION => exception = true,
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(Domain {
            value: value.ok_or_else(|| Self::missing(NODE, "value"))?,
            exception,
            span: span.finish(),
        })
    }

    fn cosmetic_body(&mut self) -> Result<CosmeticBody, DeserializeError> {
        let offset = self.pos;
        let node = self.node_type()?;
        match node {
            NodeType::ElementHidingBody => {
                let mut selector = None;
                loop {
                    match self.u8()? {
                        NULL => break,
                        element_hiding_body::SELECTOR => selector = Some(self.string()?),
                        tag => return Err(Self::unknown(node, tag)),
                    }
                }
                Ok(CosmeticBody::ElementHiding(ElementHidingBody {
                    selector_list: selector.ok_or_else(|| Self::missing(node, "selector"))?,
                }))
            }
            NodeType::CssInjectionBody => {
                let mut body = CssInjectionBody {
                    media_query_list: None,
                    selector_list: String::new(),
                    declaration_list: None,
                    remove: false,
                };
                let mut has_selector = false;
                loop {
                    match self.u8()? {
                        NULL => break,
                        css_injection_body::MEDIA => body.media_query_list = Some(self.string()?),
                        css_injection_body::SELECTOR => {
                            body.selector_list = self.string()?;
                            has_selector = true;
                        }
                        css_injection_body::DECLARATIONS => {
                            body.declaration_list = Some(self.string()?);
                        }
                        css_injection_body::REMOVE => body.remove = true,
                        tag => return Err(Self::unknown(node, tag)),
                    }
                }
                if !has_selector {
                    return Err(Self::missing(node, "selector"));
                }
                Ok(CosmeticBody::CssInjection(body))
            }
            NodeType::ScriptletBody => {
                let mut calls = Vec::new();
                loop {
                    match self.u8()? {
                        NULL => break,
                        scriptlet_body::CALLS => {
                            let count = self.u16()?;
                            calls = (0..count)
                                .map(|_| self.scriptlet_call())
                                .collect::<Result<_, _>>()?;
                        }
                        tag => return Err(Self::unknown(node, tag)),
                    }
                }
                Ok(CosmeticBody::Scriptlet(ScriptletBody { calls }))
            }
            NodeType::HtmlFilteringBody | NodeType::JsInjectionBody => {
                let mut value = None;
                loop {
                    match self.u8()? {
                        NULL => break,
                        raw_body::VALUE => value = Some(self.string()?),
                        tag => return Err(Self::unknown(node, tag)),
                    }
                }
                let value = value.ok_or_else(|| Self::missing(node, "value"))?;
                Ok(if node == NodeType::HtmlFilteringBody {
                    CosmeticBody::HtmlFiltering(value)
                } else {
                    CosmeticBody::JsInjection(value)
                })
            }
            other => Err(DeserializeError::UnexpectedNodeType {
                expected: "cosmetic body",
                found: other.name(),
                offset,
            }),
        }
    }

    fn scriptlet_call(&mut self) -> Result<ScriptletCall, DeserializeError> {
        const NODE: NodeType = NodeType::ScriptletCall;
        self.expect(NODE)?;
        let mut params = Vec::new();
        loop {
            match self.u8()? {
                NULL => break,
                scriptlet_call::PARAMS => {
                    let count = self.u16()?;
                    params = (0..count).map(|_| self.string()).collect::<Result<_, _>>()?;
                }
                tag => return Err(Self::unknown(NODE, tag)),
            }
        }
        Ok(ScriptletCall { params })
    }

    fn network(&mut self) -> Result<NetworkRule, DeserializeError> {
        const NODE: NodeType = NodeType::NetworkRule;
        let mut syntax = AdblockSyntax::Common;
        let mut exception = false;
        let mut pattern = None;
        let mut modifiers = None;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                network_rule::SYNTAX => syntax = self.syntax()?,
                network_rule::EXCEPTION => exception = true,
                network_rule::PATTERN => pattern = Some(self.string()?),
                network_rule::MODIFIERS => modifiers = Some(self.modifier_list()?),
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(NetworkRule {
            syntax,
            exception,
            pattern: pattern.ok_or_else(|| Self::missing(NODE, "pattern"))?,
            modifiers,
            span: span.finish(),
            raws: None,
        })
    }

    fn host(&mut self) -> Result<HostRule, DeserializeError> {
        const NODE: NodeType = NodeType::HostRule;
        let mut ip = None;
        let mut hostnames = Vec::new();
        let mut comment = None;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                host_rule::IP => ip = Some(self.string()?),
                host_rule::HOSTNAMES => {
                    let count = self.u16()?;
                    hostnames = (0..count).map(|_| self.string()).collect::<Result<_, _>>()?;
                }
                host_rule::COMMENT => comment = Some(self.string()?),
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(HostRule {
            ip: ip.ok_or_else(|| Self::missing(NODE, "ip"))?,
            hostnames,
            comment,
            span: span.finish(),
            raws: None,
        })
    }

    fn modifier_list(&mut self) -> Result<ModifierList, DeserializeError> {
        const NODE: NodeType = NodeType::ModifierList;
        self.expect(NODE)?;
        let mut children = Vec::new();
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                modifier_list::CHILDREN => {
                    let count = self.u16()?;
                    children = (0..count).map(|_| self.modifier()).collect::<Result<_, _>>()?;
                }
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(ModifierList {
            children,
            span: span.finish(),
        })
    }

    fn modifier(&mut self) -> Result<Modifier, DeserializeError> {
        const NODE: NodeType = NodeType::Modifier;
        self.expect(NODE)?;
        let mut name = None;
        let mut value = None;
        let mut exception = false;
        let mut span = SpanFields::default();
        loop {
            match self.u8()? {
                NULL => break,
                modifier::NAME => name = Some(self.value(frequent::MODIFIERS)?),
                modifier::VALUE => value = Some(self.value(frequent::REDIRECTS)?),
                modifier::EXCEPTION => exception = true,
                tag => {
                    if !self.location(tag, &mut span)? {
                        return Err(Self::unknown(NODE, tag));
                    }
                }
            }
        }
        Ok(Modifier {
            name: name.ok_or_else(|| Self::missing(NODE, "name"))?,
            value,
            exception,
            span: span.finish(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::serialize_rules;
    use crate::parser::{parse_rule, ParserOptions};

    fn parse_all(lines: &[&str]) -> Vec<RuleNode> {
        let options = ParserOptions {
            include_raws: false,
            parse_host_rules: true,
            ..ParserOptions::default()
        };
        lines
            .iter()
            .map(|line| parse_rule(line, &options).expect(line))
            .collect()
    }

    #[test]
    fn parsed_nodes_round_trip() {
        let nodes = parse_all(&[
            "",
            "! comment",
            "[Adblock Plus 2.0; Brave]",
            "!+ NOT_OPTIMIZED PLATFORM(windows, linux)",
            "!#if (adguard && !adguard_ext_safari) || custom_flag",
            "!#include https://example.org/list.txt",
            "!#safari_cb_affinity(general,privacy)",
            "! Title: Example",
            "! aglint-disable rule-a -- reason",
            r#"! aglint {"rule":["error",1]}"#,
            "[$path=/page]example.com,~sub.example.com#@#.ad",
            "example.com##:matches-path(/shop) .ad",
            "example.com#$#@media (min-width: 1px) { .ad { remove: true; } }",
            "example.com##.ad:style(color: red)",
            "example.com#%#//scriptlet('set-constant', 'a', '1')",
            "example.com#$#log a; log b",
            "example.com$$script[tag-content=\"x\"]",
            "example.com#%#window.x = 1;",
            "@@||example.org^$redirect=noopjs,~third-party,custom=välue",
            "127.0.0.1 a.example b.example # hosts",
        ]);
        let bytes = serialize_rules(&nodes).expect("serialize");
        assert_eq!(deserialize_rules(&bytes).expect("deserialize"), nodes);
    }

    #[test]
    fn invalid_nodes_round_trip() {
        let options = ParserOptions {
            tolerant: true,
            ..ParserOptions::default()
        };
        let node = parse_rule("[Adblock Plus 2.0 3.0]", &options).expect("tolerant");
        let bytes = crate::binary::serialize_rule(&node).expect("serialize");
        assert_eq!(deserialize_rule(&bytes).expect("deserialize"), node);
    }

    #[test]
    fn long_domain_lists_round_trip() {
        let domains: Vec<String> = (0..300).map(|i| format!("d{i}.com")).collect();
        let line = format!("{}##.ad", domains.join(","));
        let nodes = parse_all(&[line.as_str()]);
        let RuleNode::Cosmetic(rule) = &nodes[0] else {
            panic!("expected cosmetic rule");
        };
        assert_eq!(rule.domains.len(), 300);

        let bytes = serialize_rules(&nodes).expect("serialize");
        assert_eq!(deserialize_rules(&bytes).expect("deserialize"), nodes);
    }

    #[test]
    fn schema_mismatch_is_rejected_before_payload() {
        let nodes = parse_all(&["||example.org^"]);
        let mut bytes = serialize_rules(&nodes).expect("serialize");
        bytes[header::SCHEMA_VERSION] = 1;
        // Corrupt the payload too: the version check must fire first.
        bytes[HEADER_SIZE] = 0xEE;
        assert_eq!(
            deserialize_rules(&bytes),
            Err(DeserializeError::SchemaMismatch { expected: 2, found: 1 })
        );
    }

    #[test]
    fn malformed_buffers() {
        assert_eq!(deserialize_rules(&[1, 2]), Err(DeserializeError::UnexpectedEof(2)));
        assert_eq!(
            deserialize_rules(b"NOPE\x01\x00\x00\x00\x00\x00"),
            Err(DeserializeError::InvalidMagic)
        );

        let nodes = parse_all(&["||example.org^"]);
        let bytes = serialize_rules(&nodes).expect("serialize");
        assert!(matches!(
            deserialize_rules(&bytes[..bytes.len() - 1]),
            Err(DeserializeError::UnexpectedEof(_))
        ));

        let mut unknown = bytes.clone();
        unknown[HEADER_SIZE] = 0xEE;
        assert!(matches!(
            deserialize_rules(&unknown),
            Err(DeserializeError::UnknownNodeType { tag: 0xEE, .. })
        ));

        let mut trailing = bytes;
        trailing.push(0);
        assert_eq!(deserialize_rules(&trailing), Err(DeserializeError::TrailingBytes(1)));
    }

    #[test]
    fn header_info() {
        let bytes = serialize_rules(&parse_all(&["a", "b"])).expect("serialize");
        let info = read_header(&bytes).expect("header");
        assert_eq!(info.node_count, 2);
        assert_eq!(info.schema_version, BINARY_SCHEMA_VERSION);
        assert_eq!(info.byte_len, bytes.len());
    }
}
