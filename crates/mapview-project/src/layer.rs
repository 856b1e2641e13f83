//! Map layers registered in a project.

use serde::{Deserialize, Serialize};
use std::fmt;

use mapview_core::dom::XmlElement;
use mapview_core::{CoordinateReferenceSystem, Rectangle};

/// Geometry type of a vector layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    Line,
    Polygon,
    Unknown,
    /// Attribute-only table
    NoGeometry,
}

impl GeometryType {
    /// Parse the `geometry` attribute of a `<maplayer>`.
    pub fn from_attribute(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "point" | "multipoint" => Self::Point,
            "line" | "linestring" | "multilinestring" => Self::Line,
            "polygon" | "multipolygon" => Self::Polygon,
            "no geometry" | "nogeometry" | "none" | "null" => Self::NoGeometry,
            _ => Self::Unknown,
        }
    }
}

/// Kind of data provider behind a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    Vector(GeometryType),
    Raster,
    Mesh,
    VectorTile,
    PointCloud,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Vector(g) => write!(f, "vector ({:?})", g),
            LayerKind::Raster => write!(f, "raster"),
            LayerKind::Mesh => write!(f, "mesh"),
            LayerKind::VectorTile => write!(f, "vector-tile"),
            LayerKind::PointCloud => write!(f, "point-cloud"),
        }
    }
}

/// A layer as seen by the map view: identity, CRS and data extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayer {
    pub id: String,
    pub name: String,
    pub kind: LayerKind,
    pub crs: CoordinateReferenceSystem,
    /// Extent of the layer's data in the layer CRS.
    pub extent: Rectangle,
}

impl MapLayer {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: LayerKind,
        crs: CoordinateReferenceSystem,
        extent: Rectangle,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            crs,
            extent,
        }
    }

    /// Whether the layer can be drawn on a map.
    ///
    /// Only attribute tables (vector layers without geometry) are not.
    pub fn is_spatial(&self) -> bool {
        !matches!(self.kind, LayerKind::Vector(GeometryType::NoGeometry))
    }

    /// Build a layer from a `<maplayer>` element.
    ///
    /// Returns `None` without an `<id>`. Unknown layer types, a missing CRS
    /// or a missing extent degrade to defaults.
    pub fn from_xml(element: &XmlElement) -> Option<Self> {
        let id = element.child_text("id").filter(|id| !id.is_empty())?;
        let name = element.child_text("layername").unwrap_or(id);
        let kind = match element.attribute("type").unwrap_or("vector") {
            "raster" => LayerKind::Raster,
            "mesh" => LayerKind::Mesh,
            "vector-tile" => LayerKind::VectorTile,
            "point-cloud" => LayerKind::PointCloud,
            _ => LayerKind::Vector(
                element
                    .attribute("geometry")
                    .map(GeometryType::from_attribute)
                    .unwrap_or(GeometryType::Unknown),
            ),
        };
        let crs = element
            .first_child("srs")
            .and_then(CoordinateReferenceSystem::from_xml)
            .unwrap_or_default();
        let extent = element
            .first_child("extent")
            .and_then(read_rectangle)
            .unwrap_or_else(Rectangle::null);

        Some(Self::new(id, name, kind, crs, extent))
    }
}

/// Read `<xmin>`, `<ymin>`, `<xmax>`, `<ymax>` children into a rectangle.
pub fn read_rectangle(element: &XmlElement) -> Option<Rectangle> {
    let value = |name: &str| element.child_text(name)?.parse::<f64>().ok();
    Some(Rectangle::new(
        value("xmin")?,
        value("ymin")?,
        value("xmax")?,
        value("ymax")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapview_core::XmlDocument;

    #[test]
    fn test_layer_from_xml() {
        let doc = XmlDocument::parse(
            r#"<maplayer type="vector" geometry="Polygon">
                 <extent><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></extent>
                 <id>parcels_1</id>
                 <layername>Parcels</layername>
                 <srs><spatialrefsys><authid>EPSG:3857</authid></spatialrefsys></srs>
               </maplayer>"#,
        )
        .unwrap();
        let layer = MapLayer::from_xml(doc.root()).unwrap();
        assert_eq!(layer.id, "parcels_1");
        assert_eq!(layer.name, "Parcels");
        assert_eq!(layer.kind, LayerKind::Vector(GeometryType::Polygon));
        assert_eq!(layer.crs.auth_id(), "EPSG:3857");
        assert_eq!(layer.extent, Rectangle::new(1.0, 2.0, 3.0, 4.0));
        assert!(layer.is_spatial());
    }

    #[test]
    fn test_table_is_not_spatial() {
        let doc = XmlDocument::parse(
            r#"<maplayer type="vector" geometry="No geometry"><id>t</id></maplayer>"#,
        )
        .unwrap();
        let layer = MapLayer::from_xml(doc.root()).unwrap();
        assert!(!layer.is_spatial());
        assert_eq!(layer.name, "t");
        assert!(layer.extent.is_null());
    }

    #[test]
    fn test_layer_without_id_is_skipped() {
        let doc = XmlDocument::parse(r#"<maplayer type="raster"/>"#).unwrap();
        assert!(MapLayer::from_xml(doc.root()).is_none());
    }

    #[test]
    fn test_read_rectangle_requires_all_bounds() {
        let doc = XmlDocument::parse("<extent><xmin>0</xmin><ymin>x</ymin></extent>").unwrap();
        assert!(read_rectangle(doc.root()).is_none());
    }
}
