use super::Graph;

impl Graph {
    /// Serializes the graph in Graphviz DOT syntax.
    ///
    /// Node labels are emitted as HTML-like labels (`label=<...>`).
    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        if !self.comment.is_empty() {
            dot.push_str(&format!("// {}\n", self.comment));
        }
        dot.push_str(&format!("digraph {} {{\n", quote(&self.name)));
        for (id, node) in self.nodes() {
            dot.push_str(&format!(
                "\t{} [label=<{}> shape={}]\n",
                quote(id),
                node.label,
                node.shape
            ));
        }
        for (from, to) in self.edges() {
            dot.push_str(&format!("\t{} -> {}\n", quote(from), quote(to)));
        }
        dot.push_str("}\n");
        dot
    }
}

fn quote(id: &str) -> String {
    format!("\"{}\"", id.replace('"', "\\\""))
}
