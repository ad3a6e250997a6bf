//! Codec resolution over a plan subtree.

use streamc_core::codec::CodecDescriptor;
use streamc_core::dag::PlanNode;

/// Wire format used by the rows a subtree produces.
///
/// Sources answer with their declared codec. Joins answer with the codec of
/// their *left* input; the right input's format is ignored even when it
/// differs. Every other node defers to its single child.
pub fn resolve_codec(node: &PlanNode) -> &CodecDescriptor {
    match node {
        PlanNode::Source(n) => &n.codec,
        PlanNode::Filter(n) => resolve_codec(&n.source),
        PlanNode::Project(n) => resolve_codec(&n.source),
        PlanNode::Join(n) => resolve_codec(&n.left),
        PlanNode::Output(n) => resolve_codec(&n.source),
    }
}
