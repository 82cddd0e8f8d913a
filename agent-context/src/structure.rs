//! Stage 3: emit labeled sections in a fixed, stable order.

use crate::packet::{ContextPacket, PacketType};

/// One labeled section of a structured prompt. `label` is the exact
/// literal header string (e.g. `"[Task]"`), `body` its rendered content.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub label: String,
    pub body: String,
}

impl Section {
    pub fn new(label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            body: body.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Joins non-empty sections as `"[Label]\nbody"`, blank-line separated.
pub fn render(sections: &[Section]) -> String {
    sections
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| format!("{}\n{}", s.label, s.body))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Turns admitted packets into text.
pub trait Structurer: Send + Sync {
    fn structure(&self, packets: &[ContextPacket], query: &str, output_template: &str) -> Vec<Section>;
}

/// The six fixed-order labeled sections: Role & Policies, Task, State,
/// Evidence, Context, Output.
pub struct DefaultStructurer;

const EVIDENCE_HEADER: &str = "事实与引用：";

impl Structurer for DefaultStructurer {
    fn structure(&self, packets: &[ContextPacket], query: &str, output_template: &str) -> Vec<Section> {
        let joined = |ty: PacketType| -> String {
            packets
                .iter()
                .filter(|p| p.packet_type == ty)
                .map(|p| p.content.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        };

        let role_policies = joined(PacketType::Instructions);

        let task_packets = joined(PacketType::Task);
        let task = if !task_packets.is_empty() {
            task_packets
        } else {
            query.to_string()
        };

        let state = joined(PacketType::TaskState);

        let mut evidence_packets: Vec<&ContextPacket> =
            packets.iter().filter(|p| p.packet_type == PacketType::Evidence).collect();
        evidence_packets.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(std::cmp::Ordering::Equal));
        let evidence = if evidence_packets.is_empty() {
            String::new()
        } else {
            let mut body = String::from(EVIDENCE_HEADER);
            for p in evidence_packets {
                body.push('\n');
                body.push_str(&format!("[来源: {}]\n{}", p.source, p.content));
            }
            body
        };

        let context = {
            let mut items: Vec<&ContextPacket> = packets
                .iter()
                .filter(|p| matches!(p.packet_type, PacketType::History | PacketType::Custom))
                .collect();
            items.sort_by_key(|p| p.packet_type.priority());
            items.into_iter().map(|p| p.content.as_str()).collect::<Vec<_>>().join("\n")
        };

        vec![
            Section::new("[Role & Policies]", role_policies),
            Section::new("[Task]", task),
            Section::new("[State]", state),
            Section::new("[Evidence]", evidence),
            Section::new("[Context]", context),
            Section::new("[Output]", output_template),
        ]
    }
}

/// Priority-ordered concatenation, no headers.
pub struct MinimalStructurer;

impl Structurer for MinimalStructurer {
    fn structure(&self, packets: &[ContextPacket], query: &str, _output_template: &str) -> Vec<Section> {
        let mut sorted: Vec<&ContextPacket> = packets.iter().collect();
        sorted.sort_by_key(|p| p.packet_type.priority());
        let mut body = sorted.into_iter().map(|p| p.content.as_str()).collect::<Vec<_>>().join("\n");
        if body.is_empty() {
            body = query.to_string();
        }
        vec![Section::new("", body)]
    }
}

/// Substitutes named placeholders in a caller-supplied template.
pub struct TemplatedStructurer {
    template: String,
}

impl TemplatedStructurer {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }
}

impl Structurer for TemplatedStructurer {
    fn structure(&self, packets: &[ContextPacket], query: &str, _output_template: &str) -> Vec<Section> {
        let joined = |ty: PacketType| -> String {
            packets
                .iter()
                .filter(|p| p.packet_type == ty)
                .map(|p| p.content.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        };
        let history = packets
            .iter()
            .filter(|p| p.packet_type == PacketType::History)
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let custom = packets
            .iter()
            .filter(|p| p.packet_type == PacketType::Custom)
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let task = {
            let t = joined(PacketType::Task);
            if t.is_empty() { query.to_string() } else { t }
        };

        let rendered = self
            .template
            .replace("{{instructions}}", &joined(PacketType::Instructions))
            .replace("{{task}}", &task)
            .replace("{{task_state}}", &joined(PacketType::TaskState))
            .replace("{{evidence}}", &joined(PacketType::Evidence))
            .replace("{{history}}", &history)
            .replace("{{custom}}", &custom);

        vec![Section::new("", rendered)]
    }
}
