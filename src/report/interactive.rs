use serde_json::{json, Value};

use super::ClassCounts;
use crate::color::{class_color, to_hex};
use crate::data::model::Diagnosis;

/// DOM id of the chart container inside the exported fragment.
const DIV_ID: &str = "interactive-bar-chart";

/// Plotly figure (data + layout) for the class-frequency bar chart,
/// one trace per class so each gets its own colour and legend entry.
pub fn bar_figure(counts: &ClassCounts, title: &str) -> Value {
    let data: Vec<Value> = Diagnosis::ALL
        .iter()
        .filter(|&&class| counts.get(class) > 0)
        .map(|&class| {
            json!({
                "type": "bar",
                "name": class.name(),
                "x": [class.name()],
                "y": [counts.get(class)],
                "marker": { "color": to_hex(class_color(class)) },
                "hovertemplate": "Predicted Group=%{x}<br>Count=%{y}<extra></extra>",
            })
        })
        .collect();

    json!({
        "data": data,
        "layout": {
            "title": { "text": title },
            "xaxis": { "title": { "text": "Predicted Group" } },
            "yaxis": { "title": { "text": "Count" } },
            "barmode": "relative",
            "legend": { "title": { "text": "Predicted Group" } },
        },
    })
}

/// Standalone HTML page for the figure. The Plotly script itself is not
/// embedded; the host page must provide a global `Plotly`.
pub fn bar_chart_html(counts: &ClassCounts, title: &str) -> String {
    let figure = bar_figure(counts, title);
    let data = figure["data"].to_string();
    let layout = figure["layout"].to_string();

    format!(
        r#"<html>
<head><meta charset="utf-8" /></head>
<body>
<div id="{DIV_ID}" class="plotly-graph-div" style="height:100%; width:100%;"></div>
<script type="text/javascript">
window.PLOTLYENV = window.PLOTLYENV || {{}};
if (document.getElementById("{DIV_ID}")) {{
    Plotly.newPlot("{DIV_ID}", {data}, {layout}, {{"responsive": true}});
}}
</script>
</body>
</html>
"#
    )
}
