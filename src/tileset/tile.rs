//! Tile nodes
//!
//! A `TileNode` can only be obtained from [`TileBuilder::build`] (or from a
//! validated descriptor), so every node in a tree already satisfies the
//! geometric error rules: errors are finite and non-negative, every child is
//! strictly finer than its parent, and a zero-error tile is a leaf.

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use super::bounds::BoundingVolume;

/// Refinement policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Refine {
    /// Children replace the parent when refined
    #[default]
    Replace,
    /// Children are rendered in addition to the parent
    Add,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileContent {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_volume: Option<BoundingVolume>,
}

impl TileContent {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into(), bounding_volume: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileNode {
    bounding_volume: BoundingVolume,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    viewer_request_volume: Option<BoundingVolume>,
    geometric_error: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refine: Option<Refine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<TileContent>,
    /// Column-major local-to-parent transform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transform: Option<[f64; 16]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<TileNode>,
}

impl TileNode {
    pub fn bounding_volume(&self) -> &BoundingVolume {
        &self.bounding_volume
    }

    pub fn viewer_request_volume(&self) -> Option<&BoundingVolume> {
        self.viewer_request_volume.as_ref()
    }

    pub fn geometric_error(&self) -> f64 {
        self.geometric_error
    }

    pub fn refine(&self) -> Option<Refine> {
        self.refine
    }

    pub fn content(&self) -> Option<&TileContent> {
        self.content.as_ref()
    }

    pub fn transform(&self) -> Option<&[f64; 16]> {
        self.transform.as_ref()
    }

    /// Uniform scale of this node's own transform (1 without one)
    pub fn transform_scale(&self) -> f64 {
        self.transform.as_ref().map_or(1.0, |t| (t[0] * t[0] + t[1] * t[1] + t[2] * t[2]).sqrt())
    }

    pub fn children(&self) -> &[TileNode] {
        &self.children
    }

    /// Number of edges on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        self.children.iter().map(|c| c.depth() + 1).max().unwrap_or(0)
    }

    /// Pre-order walk over this node and its descendants
    pub fn walk(&self) -> Vec<&TileNode> {
        let mut out = vec![self];
        let mut i = 0;
        while i < out.len() {
            let node = out[i];
            out.extend(node.children.iter());
            i += 1;
        }
        out
    }

    /// Checks on this node and its direct children
    fn validate_local(&self) -> Result<()> {
        if !self.geometric_error.is_finite() || self.geometric_error < 0.0 {
            return Err(Error::invalid(format!(
                "geometric error must be finite and >= 0, got {}",
                self.geometric_error
            )));
        }
        if let Some(t) = &self.transform {
            if t.iter().any(|v| !v.is_finite()) {
                return Err(Error::invalid("tile transform holds non-finite values"));
            }
        }
        if let Some(content) = &self.content {
            if content.uri.is_empty() {
                return Err(Error::invalid("tile content uri is empty"));
            }
        }
        if self.geometric_error == 0.0 && !self.children.is_empty() {
            return Err(Error::topology(format!(
                "tile with geometric error 0 has {} children",
                self.children.len()
            )));
        }
        for child in &self.children {
            if child.geometric_error >= self.geometric_error {
                return Err(Error::topology(format!(
                    "child geometric error {} is not below parent {}",
                    child.geometric_error, self.geometric_error
                )));
            }
        }
        Ok(())
    }

    /// Full recursive check, for trees that did not come from the builder
    pub(crate) fn validate(&self) -> Result<()> {
        for node in self.walk() {
            node.validate_local()?;
        }
        Ok(())
    }
}

/// Builds a validated [`TileNode`]
#[derive(Debug, Clone)]
pub struct TileBuilder {
    node: TileNode,
}

impl TileBuilder {
    pub fn new(bounding_volume: BoundingVolume, geometric_error: f64) -> Self {
        Self {
            node: TileNode {
                bounding_volume,
                viewer_request_volume: None,
                geometric_error,
                refine: None,
                content: None,
                transform: None,
                children: Vec::new(),
            },
        }
    }

    pub fn refine(mut self, refine: Refine) -> Self {
        self.node.refine = Some(refine);
        self
    }

    pub fn content(mut self, content: TileContent) -> Self {
        self.node.content = Some(content);
        self
    }

    pub fn content_uri(self, uri: impl Into<String>) -> Self {
        self.content(TileContent::new(uri))
    }

    pub fn transform(mut self, transform: [f64; 16]) -> Self {
        self.node.transform = Some(transform);
        self
    }

    pub fn child(mut self, child: TileNode) -> Self {
        self.node.children.push(child);
        self
    }

    pub fn build(self) -> Result<TileNode> {
        self.node.validate_local()?;
        Ok(self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere() -> BoundingVolume {
        BoundingVolume::sphere([0.0, 0.0, 0.0, 10.0]).unwrap()
    }

    #[test]
    fn test_build_chain() {
        let leaf = TileBuilder::new(sphere(), 0.0).content_uri("high.glb").build().unwrap();
        let mid = TileBuilder::new(sphere(), 0.1).content_uri("medium.glb").child(leaf).build().unwrap();
        let root = TileBuilder::new(sphere(), 1.0)
            .refine(Refine::Replace)
            .content_uri("low.glb")
            .child(mid)
            .build()
            .unwrap();

        assert_eq!(root.depth(), 2);
        let errors: Vec<f64> = root.walk().iter().map(|n| n.geometric_error()).collect();
        assert_eq!(errors, vec![1.0, 0.1, 0.0]);
        root.validate().unwrap();
    }

    #[test]
    fn test_child_must_be_finer() {
        let child = TileBuilder::new(sphere(), 5.0).build().unwrap();
        let result = TileBuilder::new(sphere(), 1.0).child(child).build();
        assert!(matches!(result, Err(Error::UnsupportedTopology(_))));

        let equal = TileBuilder::new(sphere(), 1.0).build().unwrap();
        assert!(TileBuilder::new(sphere(), 1.0).child(equal).build().is_err());
    }

    #[test]
    fn test_zero_error_is_leaf() {
        let child = TileBuilder::new(sphere(), 0.0).build().unwrap();
        let result = TileBuilder::new(sphere(), 0.0).child(child).build();
        assert!(matches!(result, Err(Error::UnsupportedTopology(_))));
    }

    #[test]
    fn test_invalid_error_rejected() {
        assert!(matches!(TileBuilder::new(sphere(), -1.0).build(), Err(Error::InvalidArgument(_))));
        assert!(TileBuilder::new(sphere(), f64::INFINITY).build().is_err());
    }

    #[test]
    fn test_wire_shape() {
        let leaf = TileBuilder::new(sphere(), 0.0).content_uri("tree.glb").build().unwrap();
        let root = TileBuilder::new(sphere(), 10.0)
            .refine(Refine::Replace)
            .content_uri("tree_billboard.glb")
            .child(leaf)
            .build()
            .unwrap();

        let value = serde_json::to_value(&root).unwrap();
        assert_eq!(value["refine"], "REPLACE");
        assert_eq!(value["content"]["uri"], "tree_billboard.glb");
        assert_eq!(value["children"][0]["geometricError"], 0.0);
        assert!(value["children"][0].get("refine").is_none());
        assert!(value["children"][0].get("children").is_none());
        assert!(value.get("transform").is_none());
    }

    #[test]
    fn test_transform_scale() {
        let mut t = [0.0; 16];
        t[0] = 100.0;
        t[5] = 100.0;
        t[10] = 100.0;
        t[15] = 1.0;
        let node = TileBuilder::new(sphere(), 1.0).transform(t).build().unwrap();
        assert_eq!(node.transform_scale(), 100.0);
        assert_eq!(TileBuilder::new(sphere(), 1.0).build().unwrap().transform_scale(), 1.0);
    }
}
