use crate::error::GameResult;
use crate::geo::{Region, RegionId};
use crate::store::Tx;
use petgraph::dot::{Config as DotConfig, Dot};
use petgraph::graphmap::UnGraphMap;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// An immutable snapshot of the world graph, loaded from the store once per
/// operation that needs traversal. Lookups resolve canonical names first,
/// then aliases, then subreddit names.
#[derive(Debug, Clone, Default)]
pub struct Atlas {
    regions: BTreeMap<RegionId, Region>,
    by_name: HashMap<String, RegionId>,
    borders: HashMap<RegionId, BTreeSet<RegionId>>,
    embattled: HashSet<RegionId>,
}

impl Atlas {
    /// Load the whole map, including which regions currently carry a battle.
    pub fn load(tx: &Tx<'_>) -> GameResult<Atlas> {
        let mut atlas = Atlas::default();

        for region in tx.regions_all()? {
            atlas.borders.insert(region.id, tx.borders_of(region.id)?);
            atlas.by_name.insert(region.name.clone(), region.id);
            atlas.regions.insert(region.id, region);
        }

        // Aliases and srnames resolve too, but never shadow a real name.
        for (id, region) in &atlas.regions {
            for alias in tx.aliases_of(*id)? {
                atlas.by_name.entry(alias).or_insert(*id);
            }
            atlas.by_name.entry(region.srname.clone()).or_insert(*id);
        }

        for battle in tx.battles_all()? {
            atlas.embattled.insert(battle.region);
        }

        Ok(atlas)
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    /// Find a region by name, alias, or subreddit name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&Region> {
        let key = name.to_lowercase();
        self.by_name.get(&key).and_then(|id| self.regions.get(id))
    }

    /// Iterate regions in id order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn neighbors(&self, id: RegionId) -> impl Iterator<Item = RegionId> + '_ {
        self.borders.get(&id).into_iter().flatten().copied()
    }

    pub fn are_adjacent(&self, a: RegionId, b: RegionId) -> bool {
        self.borders.get(&a).map_or(false, |set| set.contains(&b))
    }

    /// Whether the region currently carries a battle, which opens it to both
    /// teams for movement.
    pub fn is_embattled(&self, id: RegionId) -> bool {
        self.embattled.contains(&id)
    }

    pub fn to_graph(&self) -> UnGraphMap<RegionId, ()> {
        let mut graph = UnGraphMap::new();
        for id in self.regions.keys() {
            graph.add_node(*id);
        }
        for (a, bs) in &self.borders {
            for b in bs {
                graph.add_edge(*a, *b, ());
            }
        }
        graph
    }

    /// Graphviz rendering of the map, with region names as labels.
    pub fn to_dot(&self) -> String {
        let graph = self.to_graph();
        let named = |_: &UnGraphMap<RegionId, ()>, node: (RegionId, &RegionId)| {
            let label = self
                .region(node.0)
                .map(|r| r.name.as_str())
                .unwrap_or_default();
            format!("label = \"{}\"", label)
        };
        format!(
            "{:?}",
            Dot::with_attr_getters(
                &graph,
                &[DotConfig::EdgeNoLabel, DotConfig::NodeNoLabel],
                &|_, _| String::new(),
                &named,
            )
        )
    }
}
